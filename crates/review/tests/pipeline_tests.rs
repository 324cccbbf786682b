//! Pipeline tests with fake providers and a mock HTTP end-to-end run

use async_trait::async_trait;
use drhp_analysis::{AnalysisClient, AnalysisError, TextStream};
use drhp_core::{AnalysisConfig, AnalysisPrompt, Config, Match, MatchSet, Query, SearchConfig};
use drhp_retrieval::{SearchClient, SearchError, SearchTrace};
use drhp_review::{
    ReviewError, ReviewObserver, ReviewOutcome, ReviewPipeline, EMPTY_QUERY_NOTICE,
    NO_RESULTS_NOTICE,
};
use futures::stream;
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type CallLog = Arc<Mutex<Vec<String>>>;

/// Fake search provider returning a fixed result
struct FakeSearch {
    result: Result<MatchSet, SearchError>,
    log: CallLog,
}

impl FakeSearch {
    fn returning(matches: Vec<Match>, log: &CallLog) -> Self {
        Self {
            result: Ok(MatchSet::new(matches)),
            log: log.clone(),
        }
    }

    fn failing(error: SearchError, log: &CallLog) -> Self {
        Self {
            result: Err(error),
            log: log.clone(),
        }
    }
}

#[async_trait]
impl SearchClient for FakeSearch {
    async fn search(&self, query: &Query) -> drhp_retrieval::Result<MatchSet> {
        self.log
            .lock()
            .unwrap()
            .push(format!("search:{}", query.as_str()));
        self.result.clone()
    }
}

/// Fake analysis provider replaying fixed chunks and recording prompts
struct FakeAnalysis {
    chunks: Vec<Result<String, AnalysisError>>,
    log: CallLog,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeAnalysis {
    fn new(chunks: Vec<Result<String, AnalysisError>>, log: &CallLog) -> Self {
        Self {
            chunks,
            log: log.clone(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AnalysisClient for FakeAnalysis {
    async fn stream(&self, prompt: &AnalysisPrompt) -> drhp_analysis::Result<TextStream> {
        self.log.lock().unwrap().push("analyze".to_string());
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        Ok(Box::pin(stream::iter(self.chunks.clone())))
    }
}

#[derive(Default)]
struct RecordingObserver {
    events: Vec<String>,
    traces: Vec<SearchTrace>,
}

impl ReviewObserver for RecordingObserver {
    fn search_started(&mut self, query: &Query) {
        self.events.push(format!("search_started:{}", query.as_str()));
    }

    fn search_traced(&mut self, trace: &SearchTrace) {
        self.events.push("search_traced".to_string());
        self.traces.push(trace.clone());
    }

    fn matches_retrieved(&mut self, matches: &MatchSet) {
        self.events.push(format!("matches_retrieved:{}", matches.len()));
    }

    fn analysis_started(&mut self) {
        self.events.push("analysis_started".to_string());
    }
}

fn ok_chunks(chunks: &[&str]) -> Vec<Result<String, AnalysisError>> {
    chunks.iter().map(|c| Ok(c.to_string())).collect()
}

fn pipeline(search: FakeSearch, analysis: FakeAnalysis) -> ReviewPipeline {
    ReviewPipeline::new(Arc::new(search), Arc::new(analysis))
}

#[tokio::test]
async fn test_blank_queries_never_reach_search() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::returning(vec![Match::new("x", 0.5)], &log),
        FakeAnalysis::new(ok_chunks(&["r"]), &log),
    );

    for raw in ["", "   ", "\t\n"] {
        let outcome = pipeline.run(raw).await.unwrap();
        assert_eq!(outcome, ReviewOutcome::EmptyQuery);
        assert_eq!(outcome.notice(), Some(EMPTY_QUERY_NOTICE));
    }
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_matches_skips_analysis() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::returning(vec![], &log),
        FakeAnalysis::new(ok_chunks(&["unused"]), &log),
    );

    let outcome = pipeline.run("related party transactions").await.unwrap();

    assert_eq!(outcome, ReviewOutcome::NoResults);
    assert_eq!(outcome.notice(), Some(NO_RESULTS_NOTICE));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["search:related party transactions".to_string()]
    );
}

#[tokio::test]
async fn test_single_match_produces_report_and_prompt() {
    let log = CallLog::default();
    let analysis = FakeAnalysis::new(ok_chunks(&["Red", " flags:", " none"]), &log);
    let prompts = analysis.prompts.clone();
    let pipeline = pipeline(
        FakeSearch::returning(
            vec![Match::new("Clause 26.1 omits risk factor X.", 0.42)],
            &log,
        ),
        analysis,
    );

    let outcome = pipeline.run("objects of the issue").await.unwrap();

    let ReviewOutcome::Completed { matches, report } = outcome else {
        panic!("expected completed review, got {outcome:?}");
    };
    assert_eq!(matches.len(), 1);
    assert_eq!(report.as_str(), "Red flags: none");

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Clause 26.1 omits risk factor X."));
    assert!(prompt.contains("red flags"));
    assert!(prompt.contains("regulatory compliance gaps"));
    assert!(prompt.contains("important takeaways"));
}

#[tokio::test]
async fn test_search_runs_before_analysis() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::returning(vec![Match::new("a", 0.9), Match::new("b", 0.8)], &log),
        FakeAnalysis::new(ok_chunks(&["done"]), &log),
    );

    pipeline.run("q").await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["search:q".to_string(), "analyze".to_string()]
    );
}

#[tokio::test]
async fn test_search_status_error_is_reported_verbatim() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::failing(
            SearchError::Status {
                status: 401,
                message: "invalid token".to_string(),
            },
            &log,
        ),
        FakeAnalysis::new(ok_chunks(&["unused"]), &log),
    );

    let err = pipeline.run("q").await.unwrap_err();

    assert_eq!(err.user_message(), "AutoRAG API Error: 401 - invalid token");
    assert_eq!(*log.lock().unwrap(), vec!["search:q".to_string()]);
}

#[tokio::test]
async fn test_search_transport_error_message() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::failing(SearchError::Transport("connection refused".to_string()), &log),
        FakeAnalysis::new(ok_chunks(&["unused"]), &log),
    );

    let err = pipeline.run("q").await.unwrap_err();
    assert_eq!(err.user_message(), "Search failed: connection refused");
}

#[tokio::test]
async fn test_stream_failure_returns_error_without_report() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::returning(vec![Match::new("excerpt", 0.5)], &log),
        FakeAnalysis::new(
            vec![
                Ok("Partial finding".to_string()),
                Err(AnalysisError::Stream("connection reset".to_string())),
            ],
            &log,
        ),
    );

    let err = pipeline.run("q").await.unwrap_err();

    assert_eq!(
        err,
        ReviewError::Analysis(AnalysisError::Stream("connection reset".to_string()))
    );
    assert!(!err.user_message().contains("Partial finding"));
    assert!(err.user_message().starts_with("Analysis failed: "));
}

#[tokio::test]
async fn test_observer_receives_events_in_order() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::returning(vec![Match::new("a", 0.9), Match::new("b", 0.8)], &log),
        FakeAnalysis::new(ok_chunks(&["ok"]), &log),
    );
    let mut observer = RecordingObserver::default();

    pipeline.run_observed("q", &mut observer).await.unwrap();

    // Fake search has no wire trace.
    assert_eq!(
        observer.events,
        vec![
            "search_started:q".to_string(),
            "matches_retrieved:2".to_string(),
            "analysis_started".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_observer_not_told_about_analysis_when_no_matches() {
    let log = CallLog::default();
    let pipeline = pipeline(
        FakeSearch::returning(vec![], &log),
        FakeAnalysis::new(ok_chunks(&["unused"]), &log),
    );
    let mut observer = RecordingObserver::default();

    pipeline.run_observed("q", &mut observer).await.unwrap();

    assert_eq!(observer.events, vec!["search_started:q".to_string()]);
}

fn sse_event(text: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
    )
}

fn config_for(search: &MockServer, analysis: &MockServer) -> Config {
    Config {
        search: SearchConfig {
            base_url: search.uri(),
            account_id: Some("acc-1".to_string()),
            index_name: Some("ipodb".to_string()),
            api_token: Some("secret-token".to_string()),
            ..Default::default()
        },
        analysis: AnalysisConfig {
            base_url: analysis.uri(),
            api_key: Some("gemini-key".to_string()),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_end_to_end_against_mock_services() {
    let search_server = MockServer::start().await;
    let analysis_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/accounts/acc-1/autorag/rags/ipodb/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"text": "Promoter holding is pledged.", "score": 0.61}]
        })))
        .expect(1)
        .mount(&search_server)
        .await;

    Mock::given(method("POST"))
        .and(path(
            "/v1beta/models/gemini-2.5-flash:streamGenerateContent",
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                [sse_event("Red Flags: "), sse_event("pledged promoter shares")].concat(),
                "text/event-stream",
            ),
        )
        .expect(1)
        .mount(&analysis_server)
        .await;

    let pipeline =
        ReviewPipeline::from_config(&config_for(&search_server, &analysis_server)).unwrap();
    let mut observer = RecordingObserver::default();
    let outcome = pipeline
        .run_observed("promoter pledges", &mut observer)
        .await
        .unwrap();

    let ReviewOutcome::Completed { matches, report } = outcome else {
        panic!("expected completed review, got {outcome:?}");
    };
    assert_eq!(
        matches.into_inner(),
        vec![Match::new("Promoter holding is pledged.", 0.61)]
    );
    assert_eq!(report.as_str(), "Red Flags: pledged promoter shares");

    assert_eq!(observer.traces.len(), 1);
    let trace = &observer.traces[0];
    assert_eq!(trace.status, Some(200));
    assert!(!serde_json::to_string(trace).unwrap().contains("secret-token"));
}

#[tokio::test]
async fn test_end_to_end_search_failure_skips_analysis() {
    let search_server = MockServer::start().await;
    let analysis_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "errors": [{"code": 10000, "message": "Authentication error"}]
        })))
        .mount(&search_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&analysis_server)
        .await;

    let pipeline =
        ReviewPipeline::from_config(&config_for(&search_server, &analysis_server)).unwrap();
    let mut observer = RecordingObserver::default();
    let err = pipeline
        .run_observed("q", &mut observer)
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "AutoRAG API Error: 401 - Authentication error"
    );
    assert_eq!(observer.traces.len(), 1);
    assert_eq!(observer.traces[0].status, Some(401));
}

#[test]
fn test_from_config_requires_credentials() {
    let err = ReviewPipeline::from_config(&Config::default()).unwrap_err();
    assert!(matches!(err, ReviewError::Search(SearchError::Config(_))));
}

#[test]
fn test_from_config_rejects_out_of_range_limits() {
    let search = SearchConfig {
        account_id: Some("acc-1".to_string()),
        index_name: Some("ipodb".to_string()),
        api_token: Some("token".to_string()),
        max_results: 0,
        ..Default::default()
    };
    let config = Config {
        search,
        analysis: AnalysisConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        },
    };

    let err = ReviewPipeline::from_config(&config).unwrap_err();
    assert!(matches!(err, ReviewError::Search(SearchError::Config(_))));
}
