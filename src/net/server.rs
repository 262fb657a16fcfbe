use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use jieba_rs::Jieba;
use tracing::info;

use crate::analysis::query::QueryTokenizer;
use crate::analysis::stopwords::StopWords;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::net::dispatcher::Dispatcher;
use crate::net::reactor::Reactor;
use crate::net::worker_pool::WorkerPool;
use crate::reader::manager::DataReaders;
use crate::search::engine::WebSearchEngine;
use crate::search::recommender::KeywordRecommender;

/// Wires artifacts, engines, worker pool and reactor together and runs the
/// serving loop until `shutdown` is raised.
pub struct SearchServer {
    config: Config,
    shutdown: Arc<AtomicBool>,
}

impl SearchServer {
    pub fn new(config: Config, shutdown: Arc<AtomicBool>) -> Self {
        SearchServer { config, shutdown }
    }

    /// Blocks on the reactor loop; returns after a clean shutdown. Any
    /// artifact-load or bind failure surfaces as an error before serving
    /// starts.
    pub fn run(&self) -> Result<()> {
        let config = &self.config;

        let readers = Arc::new(DataReaders::load(&config.data_dir)?);
        let jieba = Arc::new(Jieba::new());
        let cn_stop_words = Arc::new(StopWords::load(&config.cn_stopwords_file)?);

        let recommender = Arc::new(KeywordRecommender::new(
            readers.clone(),
            config.max_edit_distance,
            config.recommend_cache_size,
            config.edit_distance_cache_size,
        ));
        let engine = Arc::new(WebSearchEngine::new(
            readers,
            QueryTokenizer::new(jieba, cn_stop_words),
            config.max_summary_length,
            config.search_cache_size,
        ));

        let pool = WorkerPool::new(config.thread_num, config.queue_size);
        let dispatcher = Arc::new(Dispatcher::new(
            recommender,
            engine,
            pool,
            config.default_recommend_k,
            config.default_search_top_n,
        ));

        let mut reactor = Reactor::bind(
            &config.server_ip,
            config.server_port,
            self.shutdown.clone(),
        )?;

        info!(
            ip = %config.server_ip,
            port = config.server_port,
            threads = config.thread_num,
            "search server running"
        );
        reactor.run(dispatcher.clone().into_handler())?;

        // reactor stopped; drain the pool so in-flight responses finish
        match Arc::try_unwrap(dispatcher) {
            Ok(mut dispatcher) => dispatcher.shutdown(),
            Err(_) => info!("dispatcher still referenced; pool drains on drop"),
        }

        info!("search server stopped");
        Ok(())
    }
}
