use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncRead, AsyncWrite};
use tower_lsp::{ClientSocket, LspService, Server};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use robotls_stdlib::stdlib_registry;

use super::cli::{analyze_file, CliArgs, Transport};
use super::state::RobotLanguageServer;

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}

pub async fn run() {
    let args = CliArgs::parse();

    let registry = match stdlib_registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            eprintln!("robotls: {e:#}");
            std::process::exit(1);
        }
    };

    if let Some(path) = args.analyze.as_deref() {
        match analyze_file(path, args.errors_only, registry) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("robotls analyze error: {e:#}");
                std::process::exit(2);
            }
        }
        return;
    }

    init_tracing(args.log_level.as_deref());

    let roots: Vec<PathBuf> = args
        .paths
        .iter()
        .map(|p| std::fs::canonicalize(p).unwrap_or_else(|_| p.clone()))
        .collect();
    let (service, socket) =
        LspService::new(move |client| RobotLanguageServer::new(client, registry.clone(), roots.clone()));

    tokio::select! {
        result = serve(&args, service, socket) => {
            if let Err(e) = result {
                error!("{:#}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }
}

async fn serve_on<I, O>(input: I, output: O, service: LspService<RobotLanguageServer>, socket: ClientSocket)
where
    I: AsyncRead + Unpin,
    O: AsyncWrite,
{
    Server::new(input, output, socket).serve(service).await;
}

async fn serve(args: &CliArgs, service: LspService<RobotLanguageServer>, socket: ClientSocket) -> anyhow::Result<()> {
    match args.mode {
        Transport::Stdio => {
            info!("robotls {} listening on stdio", env!("CARGO_PKG_VERSION"));
            serve_on(tokio::io::stdin(), tokio::io::stdout(), service, socket).await;
        }
        Transport::Tcp => {
            let listener = tokio::net::TcpListener::bind((args.bind.as_str(), args.port))
                .await
                .with_context(|| format!("Failed to listen on {}:{}", args.bind, args.port))?;
            info!("robotls listening on {}", listener.local_addr()?);
            let (stream, peer) = listener.accept().await.context("Failed to accept client")?;
            info!("client connected from {}", peer);
            let (read, write) = tokio::io::split(stream);
            serve_on(read, write, service, socket).await;
        }
        Transport::Socket => {
            let stream = tokio::net::TcpStream::connect((args.bind.as_str(), args.port))
                .await
                .with_context(|| format!("Failed to connect to {}:{}", args.bind, args.port))?;
            info!("connected to {}:{}", args.bind, args.port);
            let (read, write) = tokio::io::split(stream);
            serve_on(read, write, service, socket).await;
        }
        Transport::Pipe => {
            let name = args.pipe_name.as_deref().context("--pipe-name is required for the pipe transport")?;
            serve_pipe(name, service, socket).await?;
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn serve_pipe(name: &str, service: LspService<RobotLanguageServer>, socket: ClientSocket) -> anyhow::Result<()> {
    let stream = tokio::net::UnixStream::connect(name)
        .await
        .with_context(|| format!("Failed to connect to pipe '{}'", name))?;
    info!("connected to pipe {}", name);
    let (read, write) = tokio::io::split(stream);
    serve_on(read, write, service, socket).await;
    Ok(())
}

#[cfg(windows)]
async fn serve_pipe(name: &str, service: LspService<RobotLanguageServer>, socket: ClientSocket) -> anyhow::Result<()> {
    let client = tokio::net::windows::named_pipe::ClientOptions::new()
        .open(name)
        .with_context(|| format!("Failed to connect to pipe '{}'", name))?;
    info!("connected to pipe {}", name);
    let (read, write) = tokio::io::split(client);
    serve_on(read, write, service, socket).await;
    Ok(())
}
