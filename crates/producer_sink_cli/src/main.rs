//! Command-line producer and sink.
//!
//! `producer-sink sink` binds a sink and prints every received message as one
//! JSON line on stdout. `producer-sink produce` connects a producer and sends
//! every JSON object read from stdin, one per line.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use producer_sink::prelude::*;
use producer_sink::{ErrorKind, FileConfig, PeerConfig};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "producer-sink")]
#[command(about = "Push JSON messages from producers to a sink")]
struct Args {
	/// TOML file with [producer] and [sink] sections
	#[arg(short, long, value_name = "FILE", global = true)]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Bind a sink and print received messages as JSON lines
	Sink {
		/// Listening address, e.g. tcp://*:5557
		#[arg(long, value_name = "ADDR")]
		bind: Option<String>,

		#[arg(long)]
		identity: Option<String>,

		/// Exit after this many messages
		#[arg(long)]
		count: Option<usize>,

		#[arg(long, value_name = "MS")]
		poll_timeout_ms: Option<u64>,
	},
	/// Connect a producer and send JSON objects read from stdin
	Produce {
		/// Sink address, e.g. tcp://127.0.0.1:5557
		#[arg(long, value_name = "ADDR")]
		connect: Option<String>,

		#[arg(long)]
		identity: Option<String>,

		#[arg(long)]
		outbound_capacity: Option<u32>,

		/// Enqueue attempts per message
		#[arg(long)]
		attempts: Option<u32>,

		#[arg(long, value_name = "MS")]
		retry_delay_ms: Option<u64>,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let file = match &args.config {
		Some(path) => FileConfig::load(path)?,
		None => FileConfig::default(),
	};

	let shutdown = CancellationToken::new();
	match args.command {
		Command::Sink {
			bind,
			identity,
			count,
			poll_timeout_ms,
		} => {
			let mut config = file.sink;
			override_peer(&mut config.peer, bind, identity, "sink")?;
			if let Some(ms) = poll_timeout_ms {
				config.poll_timeout = Duration::from_millis(ms);
			}
			run_until_interrupted(shutdown, move |token| run_sink(&config, count, &token)).await
		}
		Command::Produce {
			connect,
			identity,
			outbound_capacity,
			attempts,
			retry_delay_ms,
		} => {
			let mut config = file.producer;
			override_peer(&mut config.peer, connect, identity, "producer")?;
			if let Some(capacity) = outbound_capacity {
				config.outbound_capacity = capacity;
			}
			if let Some(attempts) = attempts {
				config.retry.attempts = attempts;
			}
			if let Some(ms) = retry_delay_ms {
				config.retry.delay = Duration::from_millis(ms);
			}
			run_until_interrupted(shutdown, move |token| {
				run_producer(&config, BufReader::new(std::io::stdin()), &token)
			})
			.await
		}
	}
}

fn override_peer(peer: &mut PeerConfig, address: Option<String>, identity: Option<String>, role: &str) -> Result<()> {
	if let Some(address) = address {
		peer.address = address;
	}
	if let Some(identity) = identity {
		peer.identity = identity;
	}
	if peer.address.is_empty() {
		bail!("no {role} address given on the command line or in the config file");
	}
	if peer.identity.is_empty() {
		peer.identity = format!("{role}-{}", std::process::id());
	}
	Ok(())
}

/// Runs a blocking peer loop on its own thread until it finishes or Ctrl-C.
///
/// The first Ctrl-C asks the loop to stop so it can clean up; a second one
/// abandons it and fails. The loop runs on a plain thread rather than the
/// runtime's blocking pool so an abandoned loop cannot hold up exit.
async fn run_until_interrupted<F>(shutdown: CancellationToken, work: F) -> Result<()>
where
	F: FnOnce(CancellationToken) -> Result<()> + Send + 'static,
{
	let (tx, mut rx) = oneshot::channel();
	let token = shutdown.clone();
	std::thread::Builder::new()
		.name("peer".into())
		.spawn(move || {
			let _ = tx.send(work(token));
		})
		.context("failed to spawn peer thread")?;

	tokio::select! {
		res = &mut rx => return res.context("peer thread panicked")?,
		_ = tokio::signal::ctrl_c() => {
			info!("received shutdown signal, press Ctrl-C again to force");
			shutdown.cancel();
		}
	}

	tokio::select! {
		res = &mut rx => res.context("peer thread panicked")?,
		_ = tokio::signal::ctrl_c() => {
			warn!("forced shutdown");
			bail!("forced shutdown before the peer was cleaned up")
		}
	}
}

fn run_sink(config: &ReceiveConfig, count: Option<usize>, shutdown: &CancellationToken) -> Result<()> {
	let mut sink = Sink::new(config)?;
	info!(peer = %sink.identity(), endpoint = %sink.last_endpoint()?, "sink listening");

	let result = drain(&mut sink, &mut std::io::stdout().lock(), count, shutdown);
	sink.cleanup();
	result.map(|_| ())
}

/// Writes received messages to `out` as JSON lines, returning how many.
fn drain(sink: &mut Sink, out: &mut impl Write, count: Option<usize>, shutdown: &CancellationToken) -> Result<usize> {
	let mut received = 0usize;

	while !shutdown.is_cancelled() && count.is_none_or(|n| received < n) {
		match sink.receive() {
			Ok(Some(msg)) => {
				serde_json::to_writer(&mut *out, &msg)?;
				writeln!(out)?;
				out.flush()?;
				received += 1;
			}
			Ok(None) => {}
			Err(e) if e.kind() == ErrorKind::MalformedMessage => {
				warn!(error = %e, "skipping malformed message");
			}
			Err(e) => return Err(e.into()),
		}
	}

	info!(received, "sink stopped");
	Ok(received)
}

/// How often the producer loop looks at the shutdown token while idle.
const INPUT_POLL: Duration = Duration::from_millis(100);

fn run_producer(config: &SendConfig, input: impl BufRead + Send + 'static, shutdown: &CancellationToken) -> Result<()> {
	let mut producer = Producer::new(config)?;
	info!(peer = %producer.identity(), address = %producer.address(), "producer connected");

	let result = spawn_line_reader(input).and_then(|lines| pump(&mut producer, &lines, shutdown));
	producer.cleanup();

	let failed = result?;
	if failed > 0 {
		bail!("{failed} message(s) could not be delivered");
	}
	Ok(())
}

/// Reads `input` line by line on a detached thread.
///
/// A read blocked on an idle terminal never keeps the producer from
/// noticing shutdown.
fn spawn_line_reader(input: impl BufRead + Send + 'static) -> Result<mpsc::Receiver<std::io::Result<String>>> {
	let (tx, rx) = mpsc::channel();
	std::thread::Builder::new()
		.name("input".into())
		.spawn(move || {
			for line in input.lines() {
				if tx.send(line).is_err() {
					break;
				}
			}
		})
		.context("failed to spawn input reader")?;
	Ok(rx)
}

/// Sends each input line, returning how many exhausted their retry budget.
fn pump(
	producer: &mut Producer,
	lines: &mpsc::Receiver<std::io::Result<String>>,
	shutdown: &CancellationToken,
) -> Result<usize> {
	let mut lineno = 0usize;
	let mut sent = 0usize;
	let mut failed = 0usize;

	while !shutdown.is_cancelled() {
		let line = match lines.recv_timeout(INPUT_POLL) {
			Ok(line) => line?,
			Err(RecvTimeoutError::Timeout) => continue,
			Err(RecvTimeoutError::Disconnected) => break,
		};
		lineno += 1;
		if line.trim().is_empty() {
			continue;
		}
		let msg: Message = match serde_json::from_str(&line) {
			Ok(msg) => msg,
			Err(e) => {
				warn!(line = lineno, error = %e, "skipping input that is not a JSON object");
				continue;
			}
		};
		if producer.send(&msg)? {
			sent += 1;
		} else {
			failed += 1;
		}
	}

	info!(sent, failed, "producer finished");
	Ok(failed)
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("producer_sink=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	// stdout carries message data; logs go to stderr.
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
