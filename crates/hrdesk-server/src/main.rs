//! hrdesk server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # First run
//!
//! An empty store has nobody to provision employees. Create the first super
//! admin and note the printed id; send it as `x-employee-id`:
//!
//! ```text
//! cargo run -p hrdesk-server -- --bootstrap-admin "Asha Rao"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chrono::Utc;
use clap::Parser;
use hrdesk_core::{employee::NewEmployee, role::Role, service::employees};
use hrdesk_server::ServerConfig;
use hrdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "hrdesk payroll and performance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a super admin with this name, print its id and exit.
  #[arg(long, value_name = "NAME")]
  bootstrap_admin: Option<String>,

  /// Employee code for `--bootstrap-admin`.
  #[arg(long, default_value = "ADMIN-001", requires = "bootstrap_admin")]
  code: String,

  /// Department for `--bootstrap-admin`.
  #[arg(long, default_value = "Administration", requires = "bootstrap_admin")]
  department: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).with_context(|| {
    format!("failed to load configuration from {:?}", cli.config)
  })?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: provision the first super admin and exit.
  if let Some(name) = cli.bootstrap_admin {
    let admin = employees::bootstrap_admin(&store, NewEmployee {
      employee_code: cli.code,
      name,
      email:         None,
      department:    cli.department,
      designation:   "Administrator".into(),
      role:          Role::SuperAdmin,
      joining_date:  Utc::now().date_naive(),
      pan:           None,
      uan:           None,
      pf_number:     None,
      bank_account:  None,
    })
    .await
    .context("failed to create super admin")?;
    println!("{}", admin.id);
    return Ok(());
  }

  let app = hrdesk_server::router(Arc::new(store), server_cfg.api_settings());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
  if let Some(rest) = path.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  Path::new(path).to_path_buf()
}
