use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::net::frame::{self, Frame, FrameType};
use crate::net::protocol::{
    now_timestamp, ErrorResponse, RecommendRequest, RecommendResponse, SearchRequest,
    SearchResponse,
};
use crate::net::reactor::{ConnectionId, FrameHandler, ResponseSender};
use crate::net::worker_pool::WorkerPool;
use crate::search::engine::WebSearchEngine;
use crate::search::recommender::KeywordRecommender;

/// Routes decoded request frames to the engines on the worker pool and
/// hands encoded responses back to the reactor.
///
/// Per-frame isolation: any failure, including a panicking handler,
/// produces a single error frame and leaves the connection open.
pub struct Dispatcher {
    recommender: Arc<KeywordRecommender>,
    engine: Arc<WebSearchEngine>,
    pool: WorkerPool,
    default_recommend_k: usize,
    default_search_top_n: usize,
}

impl Dispatcher {
    pub fn new(
        recommender: Arc<KeywordRecommender>,
        engine: Arc<WebSearchEngine>,
        pool: WorkerPool,
        default_recommend_k: usize,
        default_search_top_n: usize,
    ) -> Self {
        Dispatcher {
            recommender,
            engine,
            pool,
            default_recommend_k,
            default_search_top_n,
        }
    }

    /// The reactor-facing entry point. Blocks when the task queue is full,
    /// back-pressuring the reactor.
    pub fn into_handler(self: Arc<Self>) -> FrameHandler {
        Arc::new(move |request, connection, sender| {
            self.dispatch(request, connection, sender);
        })
    }

    pub fn dispatch(&self, request: Frame, connection: ConnectionId, sender: ResponseSender) {
        let recommender = Arc::clone(&self.recommender);
        let engine = Arc::clone(&self.engine);
        let default_k = self.default_recommend_k;
        let default_top_n = self.default_search_top_n;

        let task = move || {
            let response = catch_unwind(AssertUnwindSafe(|| {
                handle_frame(&recommender, &engine, &request, default_k, default_top_n)
            }))
            .unwrap_or_else(|_| {
                warn!("request handler panicked");
                error_frame("internal error while handling request", 500)
            });
            sender.send(connection, frame::encode(&response));
        };

        if let Err(e) = self.pool.enqueue(Box::new(task)) {
            warn!(error = %e, "cannot enqueue request");
        }
    }

    pub fn shutdown(&mut self) {
        self.pool.shutdown();
    }
}

fn handle_frame(
    recommender: &KeywordRecommender,
    engine: &WebSearchEngine,
    request: &Frame,
    default_k: usize,
    default_top_n: usize,
) -> Frame {
    match request.frame_type {
        FrameType::RecommendRequest => match serde_json::from_slice::<RecommendRequest>(
            &request.payload,
        ) {
            Ok(parsed) => {
                let k = parsed.k.unwrap_or(default_k);
                debug!(query = %parsed.query, k, "recommend request");
                let candidates = recommender.recommend(&parsed.query, k);
                Frame::json(
                    FrameType::RecommendResponse,
                    &RecommendResponse {
                        query: parsed.query,
                        timestamp: now_timestamp(),
                        candidates,
                    },
                )
            }
            Err(e) => error_frame(format!("malformed recommend request: {}", e), 400),
        },
        FrameType::SearchRequest => match serde_json::from_slice::<SearchRequest>(&request.payload)
        {
            Ok(parsed) => {
                let top_n = parsed.top_n.unwrap_or(default_top_n);
                debug!(query = %parsed.query, top_n, "search request");
                let results = engine.search(&parsed.query, top_n);
                Frame::json(
                    FrameType::SearchResponse,
                    &SearchResponse {
                        query: parsed.query,
                        timestamp: now_timestamp(),
                        total: results.len(),
                        results,
                    },
                )
            }
            Err(e) => error_frame(format!("malformed search request: {}", e), 400),
        },
        other => error_frame(
            format!("unsupported message type {:#06x}", other.as_u16()),
            other.as_u16() as i32,
        ),
    }
}

fn error_frame(message: impl Into<String>, code: i32) -> Frame {
    Frame::json(FrameType::ErrorResponse, &ErrorResponse::new(message, code))
}
