//! Full-pipeline test: build every artifact from a fixture corpus, serve
//! them over a real socket and drive both request types through the wire
//! protocol.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use jieba_rs::Jieba;

use seekd::analysis::chinese::ChineseTokenizer;
use seekd::analysis::query::QueryTokenizer;
use seekd::analysis::stopwords::StopWords;
use seekd::builder::ingest::{write_pages, PageIngestor};
use seekd::builder::inverted::InvertedIndexBuilder;
use seekd::builder::lexicon::LexiconBuilder;
use seekd::builder::simhash::{deduplicate, SimHasher};
use seekd::core::types::Language;
use seekd::net::dispatcher::Dispatcher;
use seekd::net::frame::{self, Frame, FrameType, HEADER_LEN};
use seekd::net::protocol::{
    ErrorResponse, RecommendRequest, RecommendResponse, SearchRequest, SearchResponse,
};
use seekd::net::reactor::Reactor;
use seekd::net::worker_pool::WorkerPool;
use seekd::reader::manager::DataReaders;
use seekd::search::engine::WebSearchEngine;
use seekd::search::recommender::KeywordRecommender;
use seekd::store::layout::ArtifactLayout;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <item>
      <title>首都报道</title>
      <link>https://example.cn/1</link>
      <description><![CDATA[北京 是 中国 的 首都]]></description>
    </item>
    <item>
      <title>城市报道</title>
      <link>https://example.cn/2</link>
      <description><![CDATA[上海 是 中国 的 城市]]></description>
    </item>
    <item>
      <title>首都报道转载</title>
      <link>https://mirror.example.cn/1</link>
      <description><![CDATA[北京 是 中国 的 首都]]></description>
    </item>
    <item>
      <title>长城</title>
      <link>https://example.cn/4</link>
      <description><![CDATA[长城 雄伟 壮观]]></description>
    </item>
    <item>
      <title>故宫</title>
      <link>https://example.cn/5</link>
      <description><![CDATA[故宫 历史 悠久]]></description>
    </item>
  </channel>
</rss>
"#;

/// Run both offline pipelines into `data_dir`, exactly the way the build
/// binaries do.
fn build_artifacts(root: &Path, data_dir: &Path) {
    let cn_corpus = root.join("corpus_cn");
    let en_corpus = root.join("corpus_en");
    let feeds = root.join("feeds");
    fs::create_dir_all(&cn_corpus).unwrap();
    fs::create_dir_all(&en_corpus).unwrap();
    fs::create_dir_all(&feeds).unwrap();

    fs::write(cn_corpus.join("words.txt"), "中国 中国 中国 中央 中央 忠告\n").unwrap();
    fs::write(en_corpus.join("words.txt"), "hello hello world\n").unwrap();
    fs::write(feeds.join("feed.xml"), FEED).unwrap();

    let stopwords_path = root.join("cn_stopwords.txt");
    fs::write(&stopwords_path, "的\n是\n").unwrap();

    let layout = ArtifactLayout::new(data_dir);
    layout.ensure_dir().unwrap();

    let jieba = Arc::new(Jieba::new());
    let cn_stop = Arc::new(StopWords::load(&stopwords_path).unwrap());

    let mut english = LexiconBuilder::english(Arc::new(StopWords::empty()));
    english.process_dir(&en_corpus).unwrap();
    english
        .write_artifacts(
            &layout.dictionary_path(Language::English),
            &layout.char_index_path(Language::English),
        )
        .unwrap();

    let mut chinese = LexiconBuilder::chinese(jieba.clone(), cn_stop.clone());
    chinese.process_dir(&cn_corpus).unwrap();
    chinese
        .write_artifacts(
            &layout.dictionary_path(Language::Chinese),
            &layout.char_index_path(Language::Chinese),
        )
        .unwrap();

    let tokenizer = ChineseTokenizer::new(jieba, cn_stop);
    let mut ingestor = PageIngestor::new();
    let pages = ingestor.ingest_dir(&feeds).unwrap();
    assert_eq!(pages.len(), 5);

    let unique = deduplicate(pages, &tokenizer, &SimHasher::new(10_000), 3);
    // the mirrored page (docid 3) is the only near-duplicate
    let ids: Vec<u32> = unique.iter().map(|p| p.docid).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    write_pages(&unique, &layout.webpages_path(), &layout.offsets_path()).unwrap();
    InvertedIndexBuilder::build(&unique, &tokenizer)
        .write(&layout.inverted_index_path())
        .unwrap();
}

fn round_trip(stream: &mut TcpStream, request: &Frame) -> Frame {
    stream.write_all(&frame::encode(request)).unwrap();

    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header).unwrap();
    let code = u16::from_be_bytes([header[0], header[1]]);
    let length = u32::from_be_bytes([header[2], header[3], header[4], header[5]]) as usize;
    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload).unwrap();

    Frame::new(FrameType::from_u16(code).unwrap(), payload)
}

#[test]
fn offline_build_then_online_queries() {
    let root = tempfile::tempdir().unwrap();
    let data_dir = root.path().join("data");
    build_artifacts(root.path(), &data_dir);

    // serving stack, wired the way the server binary does it
    let readers = Arc::new(DataReaders::load(&data_dir).unwrap());
    let jieba = Arc::new(Jieba::new());
    let cn_stop = Arc::new(StopWords::load(&root.path().join("cn_stopwords.txt")).unwrap());

    let recommender = Arc::new(KeywordRecommender::new(readers.clone(), 3, 64, 256));
    let engine = Arc::new(WebSearchEngine::new(
        readers,
        QueryTokenizer::new(jieba, cn_stop),
        200,
        64,
    ));
    let pool = WorkerPool::new(2, 16);
    let dispatcher = Arc::new(Dispatcher::new(recommender, engine, pool, 10, 5));

    let shutdown = Arc::new(AtomicBool::new(false));
    let mut reactor = Reactor::bind("127.0.0.1", 0, shutdown.clone()).unwrap();
    let addr = reactor.local_addr().unwrap();
    let handler = dispatcher.clone().into_handler();
    let reactor_thread = thread::spawn(move || reactor.run(handler).unwrap());

    let mut client = TcpStream::connect(addr).unwrap();
    client
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();

    // keyword recommendation
    let response = round_trip(
        &mut client,
        &Frame::json(FrameType::RecommendRequest, &RecommendRequest::new("中国", 3)),
    );
    assert_eq!(response.frame_type, FrameType::RecommendResponse);
    let parsed: RecommendResponse = serde_json::from_slice(&response.payload).unwrap();
    assert_eq!(parsed.query, "中国");
    assert_eq!(parsed.candidates[0].word, "中国");
    assert_eq!(parsed.candidates[0].edit_distance, 0);
    assert_eq!(parsed.candidates[0].frequency, 3);
    assert!(parsed
        .candidates
        .iter()
        .any(|c| c.word == "中央" && c.edit_distance == 1));

    // english recommendation goes through the letter index
    let response = round_trip(
        &mut client,
        &Frame::json(FrameType::RecommendRequest, &RecommendRequest::new("wrld", 5)),
    );
    let parsed: RecommendResponse = serde_json::from_slice(&response.payload).unwrap();
    assert!(parsed.candidates.iter().any(|c| c.word == "world"));

    // page search: intersection keeps only the page with both terms
    let response = round_trip(
        &mut client,
        &Frame::json(FrameType::SearchRequest, &SearchRequest::new("北京 中国", 5)),
    );
    assert_eq!(response.frame_type, FrameType::SearchResponse);
    let parsed: SearchResponse = serde_json::from_slice(&response.payload).unwrap();
    assert_eq!(parsed.total, 1);
    assert_eq!(parsed.results[0].docid, 1);
    assert_eq!(parsed.results[0].url, "https://example.cn/1");
    assert!(parsed.results[0].summary.contains("【北京】"));
    assert!(parsed.results[0].score > 0.0 && parsed.results[0].score <= 1.0 + 1e-9);

    // a response-typed frame sent to the server is answered with an error
    let response = round_trip(
        &mut client,
        &Frame::new(FrameType::SearchResponse, b"{}".to_vec()),
    );
    assert_eq!(response.frame_type, FrameType::ErrorResponse);
    let parsed: ErrorResponse = serde_json::from_slice(&response.payload).unwrap();
    assert_eq!(parsed.code, 0x1002);

    shutdown.store(true, Ordering::SeqCst);
    reactor_thread.join().unwrap();
}
