use clap::{Parser, Subcommand, ValueEnum};
use mayor::{initialize, load_or_create_wallet, AppState, RootConfig, RootError, StoreBackend};
use mayor_cipher::Decimal;
use mayor_core::PolicyId;
use mayor_policy::{PolicyField, PolicyRecord, PolicyStatus};
use mayor_store::PolicyQuery;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

/// Mayor: encrypted city policy ledger
///
/// Publish tax and tariff policies whose values stay encrypted at rest,
/// move them through draft, active and archived, and reveal values only
/// after signing a challenge with your wallet.
#[derive(Parser, Debug)]
#[command(name = "mayor", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the configuration file and a wallet key
    Init {
        /// Storage backend
        #[arg(long, value_enum)]
        backend: Option<BackendArg>,

        /// Path of the SQLite store
        #[arg(long)]
        store_path: Option<PathBuf>,

        /// Path of the wallet key file
        #[arg(long)]
        key_path: Option<PathBuf>,
    },

    /// Publish a new draft policy
    Publish {
        #[arg(long)]
        tax_rate: Decimal,

        #[arg(long)]
        tariff: Decimal,
    },

    /// List policies, newest first
    List {
        /// Case-insensitive match on id or mayor
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show policies in this status
        #[arg(long)]
        status: Option<PolicyStatus>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one policy
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Activate a draft policy (raises both values by 10%)
    Activate { id: String },

    /// Archive a draft or active policy
    Archive { id: String },

    /// Sign a reveal challenge and decrypt a policy's values
    Reveal {
        id: String,

        #[arg(long, value_enum, default_value = "both")]
        field: FieldArg,
    },

    /// Count policies by status
    Stats,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FieldArg {
    Tax,
    Tariff,
    Both,
}

impl FieldArg {
    fn fields(self) -> &'static [PolicyField] {
        match self {
            FieldArg::Tax => &[PolicyField::TaxRate],
            FieldArg::Tariff => &[PolicyField::Tariff],
            FieldArg::Both => &[PolicyField::TaxRate, PolicyField::Tariff],
        }
    }
}

/// Printable view of a record; ciphertexts stay encrypted.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicySummary<'a> {
    id: &'a str,
    mayor: &'a str,
    status: PolicyStatus,
    timestamp: u64,
    tax_rate: String,
    trade_tariff: String,
    happiness_impact: i64,
    revenue_impact: i64,
}

impl<'a> From<&'a PolicyRecord> for PolicySummary<'a> {
    fn from(record: &'a PolicyRecord) -> Self {
        Self {
            id: record.id().as_str(),
            mayor: record.owner().as_str(),
            status: record.status(),
            timestamp: record.created_at(),
            tax_rate: record.encrypted_tax_rate().to_wire(),
            trade_tariff: record.encrypted_tariff().to_wire(),
            happiness_impact: record.happiness_impact(),
            revenue_impact: record.revenue_impact(),
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "mayor=debug,mayor_core=debug,mayor_cipher=debug,mayor_policy=debug,mayor_store=debug",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mayor=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<RootConfig, RootError> {
    match path {
        Some(p) => RootConfig::load(p),
        None => {
            let default_path = RootConfig::default_config_path();
            RootConfig::load(&default_path)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;
    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), RootError> {
    if let Commands::Init {
        backend,
        store_path,
        key_path,
    } = cli.command
    {
        return cmd_init(cli.config.as_ref(), backend, store_path, key_path);
    }

    let config = load_config(cli.config.as_ref())?;
    let mut state = initialize(config)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Publish { tax_rate, tariff } => cmd_publish(&mut state, tax_rate, tariff).await,
        Commands::List {
            search,
            status,
            json,
        } => cmd_list(&state, search, status, json).await,
        Commands::Show { id, json } => cmd_show(&mut state, &PolicyId::new(id), json).await,
        Commands::Activate { id } => {
            state.activate(&PolicyId::new(id)).await?;
            print_last_action(&state);
            Ok(())
        }
        Commands::Archive { id } => {
            state.archive(&PolicyId::new(id)).await?;
            print_last_action(&state);
            Ok(())
        }
        Commands::Reveal { id, field } => cmd_reveal(&mut state, &PolicyId::new(id), field).await,
        Commands::Stats => cmd_stats(&state).await,
    }
}

fn print_last_action(state: &AppState) {
    if let Some(entry) = state.history().next() {
        println!("{}", entry);
    }
}

fn cmd_init(
    config_path: Option<&PathBuf>,
    backend: Option<BackendArg>,
    store_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<(), RootError> {
    let mut config = load_config(config_path)?;

    if let Some(backend) = backend {
        config.store.backend = match backend {
            BackendArg::Memory => StoreBackend::Memory,
            BackendArg::Sqlite => StoreBackend::Sqlite,
        };
    }
    if let Some(path) = store_path {
        config.store.path = path;
    }
    if let Some(path) = key_path {
        config.wallet.key_path = path;
    }
    config.validate()?;

    info!("initializing mayor");
    let wallet = load_or_create_wallet(&config.wallet.key_path)?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(RootConfig::default_config_path);
    config.save(&save_path)?;

    println!("Mayor initialized successfully.");
    println!("  Identity: {}", wallet.identity());
    println!("  Store:    {:?} ({})", config.store.backend, config.store.path.display());
    println!("  Wallet:   {}", config.wallet.key_path.display());
    println!("  Config:   {}", save_path.display());

    Ok(())
}

async fn cmd_publish(state: &mut AppState, tax_rate: Decimal, tariff: Decimal) -> Result<(), RootError> {
    let record = state.publish(tax_rate, tariff).await?;
    print_last_action(state);
    println!("  Tax rate:  {}", record.encrypted_tax_rate().preview());
    println!("  Tariff:    {}", record.encrypted_tariff().preview());
    println!(
        "  Impact:    happiness {:+}, revenue {:+}",
        record.happiness_impact(),
        record.revenue_impact()
    );
    Ok(())
}

async fn cmd_list(
    state: &AppState,
    search: String,
    status: Option<PolicyStatus>,
    json: bool,
) -> Result<(), RootError> {
    let query = PolicyQuery {
        text: search,
        status,
    };
    let records = state.search(&query).await?;

    if json {
        let summaries: Vec<PolicySummary<'_>> = records.iter().map(PolicySummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("(no policies)");
    }
    for record in &records {
        println!(
            "{:<26} {:<9} {:<42} {}",
            record.id().as_str(),
            record.status().to_string(),
            record.owner().as_str(),
            record.encrypted_tax_rate().preview()
        );
    }
    Ok(())
}

async fn cmd_show(state: &mut AppState, id: &PolicyId, json: bool) -> Result<(), RootError> {
    let record = if state.is_connected() {
        state.view(id).await?.clone()
    } else {
        state.repository().get(id).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&PolicySummary::from(&record))?);
        return Ok(());
    }

    let summary = PolicySummary::from(&record);
    println!("Policy {}", summary.id);
    println!("  Mayor:      {}", summary.mayor);
    println!("  Status:     {}", summary.status);
    println!("  Created:    {}", summary.timestamp);
    println!("  Tax rate:   {}", summary.tax_rate);
    println!("  Tariff:     {}", summary.trade_tariff);
    println!("  Happiness:  {:+}", summary.happiness_impact);
    println!("  Revenue:    {:+}", summary.revenue_impact);
    if let Ok(me) = state.identity() {
        println!("  Yours:      {}", record.is_owned_by(&me));
    }
    Ok(())
}

async fn cmd_reveal(state: &mut AppState, id: &PolicyId, field: FieldArg) -> Result<(), RootError> {
    state.view(id).await?;
    for field in field.fields() {
        let value = state.reveal(*field).await?;
        println!("{}: {}", field, value);
    }
    Ok(())
}

async fn cmd_stats(state: &AppState) -> Result<(), RootError> {
    let stats = state.stats().await?;
    println!("Policies: {}", stats.total);
    println!("  Draft:    {}", stats.draft);
    println!("  Active:   {}", stats.active);
    println!("  Archived: {}", stats.archived);
    Ok(())
}
