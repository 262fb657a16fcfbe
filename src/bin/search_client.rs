use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;
use std::process::ExitCode;

use clap::Parser;

use seekd::net::frame::{self, Frame, FrameType, HEADER_LEN};
use seekd::net::protocol::{
    ErrorResponse, RecommendRequest, RecommendResponse, SearchRequest, SearchResponse,
};

/// Interactive client for the search server.
#[derive(Parser)]
#[command(name = "search_client")]
#[command(about = "Interactive client for the corpus search server")]
struct Cli {
    /// Server host.
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port.
    #[arg(default_value_t = 8080)]
    port: u16,
}

struct Session {
    stream: TcpStream,
    host: String,
    port: u16,
    recommend_requests: usize,
    search_requests: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let stream = match TcpStream::connect((cli.host.as_str(), cli.port)) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("cannot connect to {}:{}: {}", cli.host, cli.port, e);
            return ExitCode::FAILURE;
        }
    };
    println!("connected to {}:{}", cli.host, cli.port);
    println!("type 'help' for the command list");

    let mut session = Session {
        stream,
        host: cli.host,
        port: cli.port,
        recommend_requests: 0,
        search_requests: 0,
    };

    let stdin = io::stdin();
    loop {
        print!("search> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("stdin error: {}", e);
                break;
            }
        }

        match run_command(&mut session, line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                eprintln!("request failed: {}", e);
                break;
            }
        }
    }

    println!("bye");
    ExitCode::SUCCESS
}

/// Returns Ok(false) to quit the loop.
fn run_command(session: &mut Session, line: &str) -> io::Result<bool> {
    if line.is_empty() {
        return Ok(true);
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match command {
        "quit" | "exit" => return Ok(false),
        "help" => print_help(),
        "clear" => print!("\x1b[2J\x1b[H"),
        "status" => {
            println!("server: {}:{}", session.host, session.port);
            println!("recommend requests sent: {}", session.recommend_requests);
            println!("search requests sent: {}", session.search_requests);
        }
        "recommend" => {
            if args.is_empty() {
                println!("usage: recommend <query> [k]");
                return Ok(true);
            }
            let (query, k) = split_query_and_number(&args, 10);
            session.recommend_requests += 1;
            let request = Frame::json(
                FrameType::RecommendRequest,
                &RecommendRequest::new(query, k),
            );
            let response = round_trip(&mut session.stream, &request)?;
            print_response(&response);
        }
        "search" => {
            if args.is_empty() {
                println!("usage: search <query> [topN]");
                return Ok(true);
            }
            let (query, top_n) = split_query_and_number(&args, 5);
            session.search_requests += 1;
            let request = Frame::json(FrameType::SearchRequest, &SearchRequest::new(query, top_n));
            let response = round_trip(&mut session.stream, &request)?;
            print_response(&response);
        }
        other => println!("unknown command '{}'; type 'help'", other),
    }

    Ok(true)
}

/// The trailing argument is a count when it parses as one; everything else
/// joins into the query, so multi-word queries need no quoting.
fn split_query_and_number(args: &[&str], default: usize) -> (String, usize) {
    if args.len() >= 2 {
        if let Ok(n) = args[args.len() - 1].parse::<usize>() {
            return (args[..args.len() - 1].join(" "), n);
        }
    }
    (args.join(" "), default)
}

/// One request, one response: the client serializes at the application
/// layer, so response ordering is never an issue.
fn round_trip(stream: &mut TcpStream, request: &Frame) -> io::Result<Frame> {
    stream.write_all(&frame::encode(request))?;

    let mut header = [0u8; HEADER_LEN];
    stream.read_exact(&mut header)?;
    let code = u16::from_be_bytes([header[0], header[1]]);
    let length = u32::from_be_bytes([header[2], header[3], header[4], header[5]]) as usize;

    let mut payload = vec![0u8; length];
    stream.read_exact(&mut payload)?;

    let frame_type = FrameType::from_u16(code).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unknown response type {:#06x}", code),
        )
    })?;
    Ok(Frame::new(frame_type, payload))
}

fn print_response(response: &Frame) {
    match response.frame_type {
        FrameType::RecommendResponse => {
            match serde_json::from_slice::<RecommendResponse>(&response.payload) {
                Ok(parsed) => {
                    println!("{} candidate(s) for '{}':", parsed.candidates.len(), parsed.query);
                    for (rank, candidate) in parsed.candidates.iter().enumerate() {
                        println!(
                            "  {:>2}. {}  (distance {}, frequency {})",
                            rank + 1,
                            candidate.word,
                            candidate.edit_distance,
                            candidate.frequency
                        );
                    }
                }
                Err(e) => eprintln!("bad recommend response: {}", e),
            }
        }
        FrameType::SearchResponse => {
            match serde_json::from_slice::<SearchResponse>(&response.payload) {
                Ok(parsed) => {
                    println!("{} result(s) for '{}':", parsed.total, parsed.query);
                    for result in &parsed.results {
                        println!("  [{}] {}  (score {:.4})", result.docid, result.title, result.score);
                        println!("      {}", result.url);
                        println!("      {}", result.summary);
                    }
                }
                Err(e) => eprintln!("bad search response: {}", e),
            }
        }
        FrameType::ErrorResponse => {
            match serde_json::from_slice::<ErrorResponse>(&response.payload) {
                Ok(parsed) => eprintln!("server error {}: {}", parsed.code, parsed.error),
                Err(e) => eprintln!("bad error response: {}", e),
            }
        }
        other => eprintln!("unexpected response type {:?}", other),
    }
}

fn print_help() {
    println!("commands:");
    println!("  recommend <query> [k]     keyword recommendations");
    println!("  search <query> [topN]     web-page search");
    println!("  status                    connection and session counters");
    println!("  clear                     clear the screen");
    println!("  help                      this message");
    println!("  quit                      disconnect and exit");
}
