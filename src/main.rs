use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use sentinel::automod::{ActionExecutor, Monitor, run_sweeper};
use sentinel::bot::Bot;
use sentinel::bridge::{Bridge, BridgeDeps, Metrics};
use sentinel::commands::{CommandDispatcher, CommandPipeline, CommandRegistry, PrefixStore};
use sentinel::config::{BotConfig, BridgeConfig, ExecutorConfig, SweeperConfig};
use sentinel::platform::{
    ChannelId, ChatGateway, ChatMessage, Effect, GuildId, LocalGateway, UserId,
};
use sentinel::rules::RuleStore;
use sentinel::tasks::TaskGroup;

/// Ids of the demo guild the local gateway is seeded with.
const LOCAL_GUILD: GuildId = GuildId(1);
const LOCAL_CHANNEL: ChannelId = ChannelId(1);
const LOCAL_USER: UserId = UserId(100);
const BOT_USER: UserId = UserId(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let bot_config = BotConfig::from_env();
    let _log_guard = init_tracing(bot_config.log_file.as_deref());
    let bridge_config = BridgeConfig::from_env()?;

    eprintln!("🛡️  Sentinel v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Dashboard: {}", bridge_config.url);
    eprintln!("   Prefix: {}", bot_config.prefix);

    // Local platform adapter: one seeded guild so the whole engine can be
    // driven from stdin. Real platform adapters plug in behind ChatGateway.
    let gateway = Arc::new(LocalGateway::new(BOT_USER));
    gateway.add_guild(LOCAL_GUILD, "local", 1).await;
    gateway
        .add_channel(LOCAL_GUILD, LOCAL_CHANNEL, "general")
        .await;
    let dyn_gateway: Arc<dyn ChatGateway> = gateway.clone();

    let rules = Arc::new(RuleStore::new());
    let prefixes = Arc::new(PrefixStore::new(bot_config.prefix.clone()));
    let metrics = Arc::new(Metrics::new());

    let executor = Arc::new(ActionExecutor::new(
        dyn_gateway.clone(),
        ExecutorConfig::default(),
    ));
    let monitor = Arc::new(Monitor::new(rules.clone(), executor));

    let registry = Arc::new(CommandRegistry::with_builtins());
    eprintln!("   Commands: {} registered", registry.len());
    let pipeline = Arc::new(CommandPipeline::new(
        registry,
        dyn_gateway.clone(),
        rules.clone(),
        metrics.clone(),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        dyn_gateway.clone(),
        pipeline.clone(),
        prefixes.clone(),
    ));
    let bot = Arc::new(Bot::new(
        dyn_gateway.clone(),
        monitor.clone(),
        pipeline,
        prefixes.clone(),
        metrics.clone(),
    ));

    let (bridge, _bridge_handle) = Bridge::new(
        bridge_config,
        BridgeDeps {
            gateway: dyn_gateway,
            dispatcher,
            rules,
            prefixes,
            metrics,
        },
    );

    let mut tasks = TaskGroup::new();
    let cancel = tasks.token();
    tasks.spawn("bridge", async move {
        if let Err(e) = bridge.run(cancel).await {
            tracing::error!(error = %e, "Bridge stopped");
        }
    });
    let cancel = tasks.token();
    tasks.spawn(
        "sweeper",
        run_sweeper(monitor.tracker(), SweeperConfig::default(), cancel),
    );

    eprintln!("   Type a message and press Enter (you are user {LOCAL_USER} in #general).\n");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => eprintln!("\nShutting down..."),
        _ = drive_from_stdin(gateway, bot) => eprintln!("stdin closed, shutting down"),
    }

    tasks.shutdown().await;
    Ok(())
}

/// Feed stdin lines through the real message handler and echo the effects.
async fn drive_from_stdin(gateway: Arc<LocalGateway>, bot: Arc<Bot>) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    eprint!("> ");
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    eprint!("> ");
                    continue;
                }
                let msg = ChatMessage {
                    id: gateway.next_message_id().await,
                    guild: LOCAL_GUILD,
                    channel: LOCAL_CHANNEL,
                    author: LOCAL_USER,
                    mention_count: line.matches('@').count() as u32,
                    content: line,
                    author_is_bot: false,
                    sent_at: Utc::now(),
                };
                gateway.record_message(msg.clone()).await;
                bot.handle_message(&msg).await;

                for effect in gateway.take_effects().await {
                    match effect {
                        Effect::Sent { content, .. } | Effect::Notice { content, .. } => {
                            println!("{content}")
                        }
                        Effect::Deleted { message, .. } => {
                            println!("[deleted message {message}]")
                        }
                        Effect::Timeout { user, duration, .. } => {
                            println!("[timed out user {user} for {}s]", duration.as_secs())
                        }
                    }
                }
                eprint!("> ");
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Error reading stdin");
                break;
            }
        }
    }
}

/// Stderr logging, plus a file layer when configured.
fn init_tracing(log_file: Option<&str>) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let appender = tracing_appender::rolling::never(".", path.to_string());
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr.and(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}
