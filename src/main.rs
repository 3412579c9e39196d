//! TickerTribe CLI
//!
//! Follow a simulated master trader from the terminal: watch trades arrive,
//! comment on them, and copy them to a simulated brokerage after approval.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ticker_tribe::db::Database;
use ticker_tribe::feed::TradeFeed;
use ticker_tribe::models::{default_brokerages, stock_url};
use ticker_tribe::notifications::{Silent, SoundPlayer, TerminalBell};
use ticker_tribe::store::{keys, read_or, JsonFileStore, PreferenceStore};
use ticker_tribe::trading::{BrokerageRegistry, QuantityMode, QuantityPreference, UNKNOWN_BROKERAGE};
use ticker_tribe::validation::{check_username, validate_signup};
use ticker_tribe::{AppConfig, Dashboard, DashboardEvent};

/// TickerTribe copy-trading CLI.
#[derive(Parser)]
#[command(name = "tickertribe")]
#[command(about = "Follow a master trader and copy their trades", long_about = None)]
struct Cli {
    /// Preference file path
    #[arg(short, long, env = "TICKERTRIBE_PREFS", default_value = "./tickertribe.json")]
    prefs: PathBuf,

    /// Database URL for copy execution history
    #[arg(
        short,
        long,
        env = "TICKERTRIBE_DATABASE",
        default_value = "sqlite:./tickertribe.db?mode=rwc"
    )]
    database: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TICKERTRIBE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Refuse to approve copies routed to a disconnected brokerage
    #[arg(long, env = "TICKERTRIBE_REQUIRE_CONNECTED")]
    require_connected: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a live dashboard session
    Run {
        /// Seed the simulated feed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// Feed polling interval in milliseconds
        #[arg(long, default_value = "15000", value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval_ms: u64,

        /// Chance (0.0 to 1.0) that a poll produces a trade
        #[arg(long, default_value = "0.3", value_parser = parse_probability)]
        arrival_probability: f64,

        /// Never ring the terminal bell
        #[arg(long)]
        mute: bool,
    },

    /// List brokerages and their connection state
    Brokerages,

    /// Toggle a brokerage connection
    Connect {
        /// Brokerage id (e.g. robinhood)
        id: String,
    },

    /// Set the default brokerage ("none" to clear)
    Default {
        /// Brokerage id
        id: String,
    },

    /// Show configuration and stored preferences
    Prefs,

    /// Show executed copy trades
    History {
        /// Number of executions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: i64,
    },

    /// Validate a signup form (simulated)
    Signup {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        confirm: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store: Arc<dyn PreferenceStore> = Arc::new(JsonFileStore::open(&cli.prefs));

    let config = AppConfig {
        require_connected_brokerage: cli.require_connected,
        ..AppConfig::default()
    };

    match cli.command {
        Commands::Run {
            seed,
            poll_interval_ms,
            arrival_probability,
            mute,
        } => {
            let db = Database::new(&cli.database).await?;
            let config = AppConfig {
                poll_interval_ms,
                trade_arrival_probability: arrival_probability,
                ..config
            };
            run_session(config, store, db, seed, mute).await?;
        }

        Commands::Brokerages => {
            let registry = BrokerageRegistry::load(store);
            print_brokerages(&registry);
        }

        Commands::Connect { id } => {
            let mut registry = BrokerageRegistry::load(store);
            match registry.toggle_connection(&id) {
                Some(true) => println!("Connected: {}", registry.display_name(&id)),
                Some(false) => println!("Disconnected: {}", registry.display_name(&id)),
                None => anyhow::bail!("Unknown brokerage '{}'", id),
            }
        }

        Commands::Default { id } => {
            let mut registry = BrokerageRegistry::load(store);
            set_default(&mut registry, &id);
        }

        Commands::Prefs => {
            print_prefs(&config, store.as_ref());
        }

        Commands::History { limit } => {
            let db = Database::new(&cli.database).await?;
            let executions = db.recent_executions(limit).await?;
            let stats = db.execution_stats().await?;

            if executions.is_empty() {
                println!("No copy trades executed yet. Use 'tickertribe run' to start.");
                return Ok(());
            }

            println!(
                "\n{:<26} {:<6} {:<7} {:>6} {:>10}  {}",
                "EXECUTED", "ACTION", "TICKER", "QTY", "PRICE", "BROKERAGE"
            );
            println!("{}", "-".repeat(80));
            for e in &executions {
                println!(
                    "{:<26} {:<6} {:<7} {:>6} {:>10}  {}",
                    truncate(&e.executed_at, 25),
                    e.action,
                    e.ticker,
                    e.quantity,
                    format!("${}", e.price),
                    e.brokerage
                );
            }
            println!(
                "\nTotal: {} copies ({} buys, {} sells), {} shares",
                stats.total, stats.buys, stats.sells, stats.shares
            );
        }

        Commands::Signup {
            username,
            password,
            confirm,
        } => {
            let status = check_username(&username);
            println!("{}", status.message());
            if let Err(e) = validate_signup(&username, &password, &confirm) {
                anyhow::bail!("{}", e);
            }
            info!(username = %username, "Signup validated");
            println!("Account created for {} (simulated)", username);
        }
    }

    Ok(())
}

/// Whether the session loop should keep going.
#[derive(PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

async fn run_session(
    config: AppConfig,
    store: Arc<dyn PreferenceStore>,
    db: Database,
    seed: Option<u64>,
    mute: bool,
) -> Result<()> {
    let feed = match seed {
        Some(seed) => TradeFeed::seeded(seed, config.trade_arrival_probability),
        None => TradeFeed::new(config.trade_arrival_probability),
    };
    let player: Box<dyn SoundPlayer> = if mute {
        Box::new(Silent)
    } else {
        Box::new(TerminalBell)
    };

    let mut dashboard = Dashboard::new(config, store, player, feed);
    dashboard.start();

    println!("\n=== TickerTribe ===");
    println!(
        "Brokerages connected: {}/{}",
        dashboard.registry().connected_count(),
        dashboard.registry().list().len()
    );
    println!("Loading trades... type 'help' for commands, Ctrl+C to stop.\n");

    let started = Instant::now();
    let elapsed_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = dashboard
            .next_due_ms()
            .map(|ms| started + Duration::from_millis(ms));

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                for event in dashboard.advance(elapsed_ms()) {
                    print_event(&dashboard, &event);
                }
                if handle_command(&mut dashboard, &db, line.trim()).await == Flow::Quit {
                    break;
                }
            }
            _ = wait_until(deadline) => {
                for event in dashboard.advance(elapsed_ms()) {
                    print_event(&dashboard, &event);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n\nStopping...");
                break;
            }
        }
    }

    println!("\n{}", dashboard.stats());
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

async fn handle_command(dashboard: &mut Dashboard, db: &Database, line: &str) -> Flow {
    let mut parts = line.splitn(3, char::is_whitespace);
    let command = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("");

    match command.as_str() {
        "" => {}
        "help" | "?" => print_help(),
        "quit" | "exit" | "q" => return Flow::Quit,
        "trades" | "ls" => print_trades(dashboard),
        "status" => println!("{}", dashboard.stats()),

        "copy" => match parse_id(arg) {
            Some(id) => match dashboard.copy_trade(id).map(|_| ()) {
                Ok(_) => print_pending(dashboard),
                Err(e) => println!("{}", e),
            },
            None => println!("Usage: copy <trade id>"),
        },
        "mode" => match arg.parse::<QuantityMode>() {
            Ok(mode) => {
                dashboard.engine_mut().set_quantity_mode(mode);
                println!("Quantity mode: {}", mode);
                print_pending(dashboard);
            }
            Err(e) => println!("{}", e),
        },
        "custom" => match arg.parse::<u32>() {
            Ok(n) => {
                dashboard.engine_mut().set_custom_quantity(n);
                print_pending(dashboard);
            }
            Err(_) => println!("Usage: custom <shares>"),
        },
        "pct" | "percent" => match arg.parse::<u32>() {
            Ok(p) => {
                dashboard.engine_mut().set_percentage(p);
                print_pending(dashboard);
            }
            Err(_) => println!("Usage: pct <percent>"),
        },
        "qty" => match arg.parse::<u32>() {
            Ok(n) if dashboard.engine_mut().set_pending_quantity(n) => print_pending(dashboard),
            Ok(_) => println!("No copy trade is awaiting approval"),
            Err(_) => println!("Usage: qty <shares>"),
        },
        "broker" => {
            if dashboard.engine_mut().select_brokerage(arg) {
                print_pending(dashboard);
            } else {
                println!("No copy trade is awaiting approval");
            }
        }
        "approve" => match dashboard.approve() {
            Ok(execution) => {
                println!("{}", execution.confirmation());
                println!("  via {}", execution.brokerage);
                if let Some(b) = dashboard
                    .registry()
                    .list()
                    .iter()
                    .find(|b| b.name == execution.brokerage)
                {
                    println!("  {}", stock_url(&b.id, &execution.ticker));
                }
                if let Err(e) = db.save_execution(&execution).await {
                    warn!(error = %e, "Failed to record copy execution");
                }
            }
            Err(e) => println!("{}", e),
        },
        "reject" => match dashboard.reject() {
            Some(p) => println!("Rejected copy of {} {}", p.trade.action, p.trade.ticker),
            None => println!("No copy trade is awaiting approval"),
        },

        "comment" => match parse_id(arg) {
            Some(id) => match dashboard.add_comment(id, rest) {
                Ok(c) => println!("{}: {}", c.username, c.text),
                Err(e) => println!("{}", e),
            },
            None => println!("Usage: comment <trade id> <text>"),
        },
        "comments" => match parse_id(arg).and_then(|id| dashboard.trade(id)) {
            Some(trade) => {
                if trade.comments().is_empty() {
                    println!("No comments yet");
                }
                for c in trade.comments() {
                    println!("  [{}] {}: {}", c.timestamp.format("%H:%M"), c.username, c.text);
                }
                if dashboard.comment_limit_notice(trade.id) {
                    println!("  (comment limit reached)");
                }
            }
            None => println!("Usage: comments <trade id>"),
        },

        "notifications" => {
            for n in dashboard.notifications().active() {
                let state = if n.visible { "" } else { " (fading)" };
                println!("  #{} {}{}", n.id, n.headline(), state);
                if let Some(message) = n.message() {
                    println!("      {}", message);
                }
            }
        }
        "dismiss" => match parse_id(arg) {
            Some(id) if dashboard.dismiss_notification(id) => {}
            _ => println!("No visible notification with that id"),
        },
        "sound" => {
            let on = dashboard.toggle_sound();
            println!("Sound {}", if on { "on" } else { "off" });
        }

        "brokerages" => print_brokerages(dashboard.registry()),
        "connect" => match dashboard.registry_mut().toggle_connection(arg) {
            Some(on) => println!(
                "{} {}",
                if on { "Connected:" } else { "Disconnected:" },
                dashboard.registry().display_name(arg)
            ),
            None => println!("Unknown brokerage '{}'", arg),
        },
        "default" => set_default(dashboard.registry_mut(), arg),

        other => println!("Unknown command '{}'. Type 'help'.", other),
    }

    Flow::Continue
}

fn print_event(dashboard: &Dashboard, event: &DashboardEvent) {
    match event {
        DashboardEvent::TradesLoaded(count) => {
            println!("Loaded {} trades.", count);
            print_trades(dashboard);
        }
        DashboardEvent::TradeArrived {
            notification_id, ..
        } => {
            if let Some(n) = dashboard.notifications().get(*notification_id) {
                println!("\n🔔 New trade: {}", n.headline());
                if let Some(note) = n.message() {
                    println!("   \"{}\"", note);
                }
                println!("   copy {} to copy it", n.trade.id);
            }
        }
        DashboardEvent::NotificationHidden(_)
        | DashboardEvent::NotificationRemoved(_)
        | DashboardEvent::CommentLimitCleared(_) => {}
    }
}

fn print_help() {
    println!("Commands:");
    println!("  trades                      List trades");
    println!("  copy <id>                   Stage a copy of a trade");
    println!("  mode <same|custom|percentage>");
    println!("  custom <n> | pct <n>        Set the custom quantity / percentage");
    println!("  qty <n>                     Override the staged quantity");
    println!("  broker <id>                 Route the staged copy to a brokerage");
    println!("  approve | reject            Decide on the staged copy");
    println!("  comment <id> <text>         Comment on a trade");
    println!("  comments <id>               Show a trade's comments");
    println!("  notifications | dismiss <id>");
    println!("  brokerages | connect <id> | default <id|none>");
    println!("  sound                       Toggle the notification sound");
    println!("  status | quit");
}

fn print_trades(dashboard: &Dashboard) {
    if dashboard.is_loading() {
        println!("Loading trades...");
        return;
    }

    let now = Utc::now();
    println!(
        "\n{:<14} {:<9} {:<5} {:<6} {:>6} {:>10} {:>4}  {}",
        "ID", "WHEN", "SIDE", "TICKER", "QTY", "PRICE", "💬", "NOTE"
    );
    println!("{}", "-".repeat(90));
    for t in dashboard.trades() {
        println!(
            "{:<14} {:<9} {:<5} {:<6} {:>6} {:>10} {:>4}  {}{}",
            t.id,
            t.time_ago(now),
            t.action,
            t.ticker,
            t.quantity,
            format!("${:.2}", t.price),
            t.comments().len(),
            if t.is_copied() { "✓ Copied  " } else { "" },
            truncate(t.notes.as_deref().unwrap_or(""), 36)
        );
    }
    println!();
}

fn print_pending(dashboard: &Dashboard) {
    let Some(p) = dashboard.engine().pending() else {
        return;
    };
    let pref = dashboard.engine().quantity_preference();
    let brokerage = if p.selected_brokerage.is_empty() {
        "(none selected)".to_string()
    } else {
        dashboard.registry().display_name(&p.selected_brokerage).to_string()
    };

    println!("\n--- Approve Copy Trade ---");
    println!(
        "  {} {} {} @ ${:.2}  (master: {} shares)",
        p.trade.action, p.quantity, p.trade.ticker, p.trade.price, p.trade.quantity
    );
    println!("  Quantity mode: {} (custom {}, {}%)", pref.mode, pref.custom_quantity, pref.percentage);
    println!("  Estimated cost: ${:.2}", p.trade.cost_for(p.quantity));
    println!("  Brokerage: {}", brokerage);

    let connected: Vec<&str> = dashboard.registry().connected().map(|b| b.id.as_str()).collect();
    if connected.is_empty() {
        println!("  No brokerages connected; use 'connect <id>' first.");
    } else {
        println!("  Connected: {}", connected.join(", "));
    }
    println!("  'approve' or 'reject'\n");
}

fn print_brokerages(registry: &BrokerageRegistry) {
    println!("\n{:<4} {:<12} {:<22} {:<10} {}", "", "ID", "NAME", "STATUS", "");
    println!("{}", "-".repeat(60));
    for b in registry.list() {
        println!(
            "{:<4} {:<12} {:<22} {:<10} {}",
            b.logo,
            b.id,
            b.name,
            if b.connected { "Connected" } else { "-" },
            if b.id == registry.default_brokerage() { "(default)" } else { "" }
        );
    }
    println!(
        "\n{} of {} connected",
        registry.connected_count(),
        registry.list().len()
    );
}

fn set_default(registry: &mut BrokerageRegistry, id: &str) {
    let id = if id.eq_ignore_ascii_case("none") { "" } else { id };
    registry.set_default_brokerage(id);

    if id.is_empty() {
        println!("Default brokerage cleared");
    } else if registry.is_connected(id) {
        println!("Default brokerage: {}", registry.display_name(id));
    } else {
        println!(
            "Default brokerage: {} (not connected; ignored until connected)",
            registry.display_name(id)
        );
    }
}

fn print_prefs(config: &AppConfig, store: &dyn PreferenceStore) {
    let quantity = QuantityPreference::read(store);
    let sound = read_or(store, keys::SOUND_ENABLED, true);
    let default_id: String = read_or(store, keys::DEFAULT_BROKERAGE, String::new());
    let brokerages = read_or(store, keys::BROKERAGES, default_brokerages());
    let default_name = if default_id.is_empty() {
        "(none)"
    } else {
        brokerages
            .iter()
            .find(|b| b.id == default_id)
            .map(|b| b.name.as_str())
            .unwrap_or(UNKNOWN_BROKERAGE)
    };

    println!("\n=== Configuration ===\n");
    println!("Feed:");
    println!("  Poll Interval:        {}ms", config.poll_interval_ms);
    println!("  Arrival Probability:  {:.0}%", config.trade_arrival_probability * 100.0);
    println!("  Max Trades Displayed: {}", config.max_trades_displayed);

    println!("\nNotifications:");
    println!("  Display Time:         {}ms", config.notification_timeout_ms);
    println!("  Fade Time:            {}ms", config.fade_duration_ms);
    println!("  Sound:                {}", if sound { "On" } else { "Off" });

    println!("\nComments:");
    println!("  Max Per Trade:        {}", config.max_comments_per_trade);
    println!("  Max Length:           {}", config.max_comment_length);

    println!("\n=== Copy Trading ===\n");
    println!("  Quantity Mode:        {}", quantity.mode);
    println!("  Custom Quantity:      {}", quantity.custom_quantity);
    println!("  Percentage:           {}%", quantity.percentage);
    println!("  Default Brokerage:    {}", default_name);
    println!(
        "  Require Connected:    {}",
        config.require_connected_brokerage
    );
}

fn parse_probability(s: &str) -> Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(format!("{} is not between 0.0 and 1.0", s))
    }
}

fn parse_id(s: &str) -> Option<u64> {
    s.trim_start_matches('#').parse().ok()
}

/// Truncate a string with ellipsis if too long.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
