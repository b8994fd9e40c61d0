//! Command-line interface.
//!
//! Parses arguments, opens the application state and dispatches to the
//! subcommand modules. Every invocation restores the comp workflow saved by
//! the previous one, so a session looks like:
//!
//! ```text
//! compscope login -e me@example.com
//! compscope search --city Austin --state TX --zip 78701
//! compscope select 2
//! compscope comps find
//! compscope comps select <id> <id> <id>
//! compscope analyze
//! ```

mod account;
mod analyze;
mod output;
mod workflow;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use compscope_client::{CreateUserRequest, UpdateUserRequest};
use compscope_core::{MaoInputsUpdate, MaoRule, RepairInputs};

use crate::models::search::SearchFilters;
use crate::models::settings::AppConfig;
use crate::state::AppState;
use crate::utils::paths::HOME_ENV;

pub use output::Reported;

#[derive(Parser)]
#[command(name = "compscope")]
#[command(about = "Comparable-sales analysis for real-estate deals")]
#[command(version)]
pub struct Cli {
    /// Application directory (config, cache and session)
    #[arg(long, global = true, env = HOME_ENV)]
    home: Option<PathBuf>,

    /// Print raw command responses as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Log level stored in the config file, read without creating anything
    pub fn configured_log_level(&self) -> Option<String> {
        let dir = match &self.home {
            Some(dir) => dir.clone(),
            None => crate::utils::paths::compscope_dir().ok()?,
        };
        let path = crate::utils::paths::config_file(&dir);
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str::<AppConfig>(&raw)
            .ok()
            .map(|config| config.log_level)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search properties by area and filters
    Search(SearchArgs),

    /// Look up one property by full address
    Lookup {
        /// Full address, e.g. "12 Oak St, Austin, TX 78701"
        address: String,
    },

    /// Make a search result the subject property and load its details
    Select {
        /// Result number from the last search, or a property id
        selector: String,
        /// URL of an uploaded subject photo (repeatable)
        #[arg(long = "image")]
        images: Vec<String>,
    },

    /// Reload full details of the subject property
    Details,

    /// Find and choose comparable sales
    Comps {
        #[command(subcommand)]
        command: CompsCommands,
    },

    /// Set the repair checklist and show the estimated total
    Repair(RepairArgs),

    /// Maximum allowable offer inputs
    Mao {
        #[command(subcommand)]
        command: MaoCommands,
    },

    /// Run the streamed analysis over the selected comparables
    Analyze,

    /// Show the last analysis result
    Results {
        /// Fetch the stored analysis from the server
        #[arg(long)]
        refresh: bool,
    },

    /// Show per-photo condition analyses of the subject
    Images,

    /// Clear the search, subject, comparables and analysis
    Reset,

    /// Sign in and store the session token
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long, env = "COMPSCOPE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the session token
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Check local storage and, optionally, the API
    Health {
        /// Also probe the API base URL
        #[arg(long)]
        api: bool,
    },
}

#[derive(Args)]
struct SearchArgs {
    /// Neighborhood or area name
    #[arg(long)]
    area: Option<String>,
    #[arg(long)]
    city: Option<String>,
    /// Two-letter state code
    #[arg(long)]
    state: Option<String>,
    /// 5-digit postal code
    #[arg(long = "zip")]
    postal_code: Option<String>,
    #[arg(long)]
    beds: Option<String>,
    #[arg(long)]
    baths: Option<String>,
    #[arg(long)]
    sqft: Option<String>,
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    /// e.g. "Single Family"
    #[arg(long = "type")]
    property_type: Option<String>,
}

impl From<SearchArgs> for SearchFilters {
    fn from(args: SearchArgs) -> Self {
        Self {
            area_name: args.area,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            beds: args.beds,
            baths: args.baths,
            sqft: args.sqft,
            min_price: args.min_price,
            max_price: args.max_price,
            property_type: args.property_type,
        }
    }
}

#[derive(Subcommand)]
enum CompsCommands {
    /// Search sold comparables around the subject
    Find,
    /// List the found comparables and the selection
    List,
    /// Add comparables to the selection (at most 5)
    Select {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove comparables from the selection
    Deselect {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Unset options keep their current value
#[derive(Args)]
struct RepairArgs {
    /// Rehab cost per square foot
    #[arg(long)]
    rate: Option<f64>,
    /// Include a roof replacement
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    roof: Option<bool>,
    #[arg(long)]
    roof_cost: Option<f64>,
    /// Include an A/C replacement
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    ac: Option<bool>,
    #[arg(long)]
    ac_cost: Option<f64>,
    /// Any other repairs, in dollars
    #[arg(long)]
    other: Option<f64>,
    /// Add a 10% contingency buffer
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    buffer: Option<bool>,
}

impl RepairArgs {
    fn is_empty(&self) -> bool {
        self.rate.is_none()
            && self.roof.is_none()
            && self.roof_cost.is_none()
            && self.ac.is_none()
            && self.ac_cost.is_none()
            && self.other.is_none()
            && self.buffer.is_none()
    }

    fn apply(self, mut inputs: RepairInputs) -> RepairInputs {
        if let Some(v) = self.rate {
            inputs.rehab_per_sqft = v;
        }
        if let Some(v) = self.roof {
            inputs.needs_roof = v;
        }
        if let Some(v) = self.roof_cost {
            inputs.roof_cost = v;
        }
        if let Some(v) = self.ac {
            inputs.needs_ac = v;
        }
        if let Some(v) = self.ac_cost {
            inputs.ac_cost = v;
        }
        if let Some(v) = self.other {
            inputs.other_repair = v;
        }
        if let Some(v) = self.buffer {
            inputs.add_buffer = v;
        }
        inputs
    }
}

#[derive(Subcommand)]
enum MaoCommands {
    /// Show the current inputs
    Show,
    /// Change inputs; unset options are left alone
    Set {
        /// 65%, 70%, 75%, custom or sop
        #[arg(long, value_parser = workflow::parse_mao_rule)]
        rule: Option<MaoRule>,
        /// Overrides the repair total until the next `repair`
        #[arg(long)]
        repairs: Option<f64>,
        #[arg(long)]
        holding: Option<f64>,
        #[arg(long)]
        closing: Option<f64>,
        #[arg(long)]
        fee: Option<f64>,
    },
    /// Recalculate MAO of the last analysis on the server
    Recalculate,
}

#[derive(Subcommand)]
enum UsersCommands {
    List,
    Create {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set one value: api_base_url, request_timeout_secs,
    /// connect_timeout_secs, proxy (URL such as socks5://user@host:1080, or "none") or log_level
    Set { key: String, value: String },
}

/// Run the parsed command line
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = match &cli.home {
        Some(dir) => AppState::open(dir)?,
        None => AppState::new()?,
    };
    let mut out = output::Output::new(state.notifier().subscribe(), cli.json);
    let out = &mut out;
    let state = &state;

    match cli.command {
        Commands::Search(args) => workflow::cmd_search(state, out, args.into()).await,
        Commands::Lookup { address } => workflow::cmd_lookup(state, out, &address).await,
        Commands::Select { selector, images } => {
            workflow::cmd_select(state, out, &selector, images).await
        }
        Commands::Details => workflow::cmd_details(state, out).await,
        Commands::Comps { command } => match command {
            CompsCommands::Find => workflow::cmd_comps_find(state, out).await,
            CompsCommands::List => workflow::cmd_comps_list(state, out),
            CompsCommands::Select { ids } => workflow::cmd_comps_toggle(state, out, &ids, true),
            CompsCommands::Deselect { ids } => workflow::cmd_comps_toggle(state, out, &ids, false),
        },
        Commands::Repair(args) => {
            let inputs = if args.is_empty() {
                None
            } else {
                Some(args.apply(state.comps().repair_inputs()))
            };
            workflow::cmd_repair(state, out, inputs)
        }
        Commands::Mao { command } => match command {
            MaoCommands::Show => workflow::cmd_mao_show(state, out),
            MaoCommands::Set {
                rule,
                repairs,
                holding,
                closing,
                fee,
            } => {
                let update = MaoInputsUpdate {
                    estimated_repairs: repairs,
                    holding_cost: holding,
                    closing_cost: closing,
                    wholesale_fee: fee,
                    mao_rule: rule,
                };
                workflow::cmd_mao_set(state, out, update)
            }
            MaoCommands::Recalculate => workflow::cmd_mao_recalculate(state, out).await,
        },
        Commands::Analyze => analyze::cmd_analyze(state, out).await,
        Commands::Results { refresh } => analyze::cmd_results(state, out, refresh).await,
        Commands::Images => analyze::cmd_images(state, out).await,
        Commands::Reset => analyze::cmd_reset(state, out),
        Commands::Login { email, password } => {
            account::cmd_login(state, out, &email, password).await
        }
        Commands::Logout => account::cmd_logout(state, out).await,
        Commands::Whoami => account::cmd_whoami(state, out).await,
        Commands::Users { command } => match command {
            UsersCommands::List => account::cmd_users_list(state, out).await,
            UsersCommands::Create {
                first_name,
                last_name,
                email,
                password,
                role,
            } => {
                let mut request =
                    CreateUserRequest::from_names(&first_name, &last_name, &email, &password);
                request.role = role;
                account::cmd_users_create(state, out, request).await
            }
            UsersCommands::Update {
                id,
                name,
                email,
                password,
                role,
            } => {
                let request = UpdateUserRequest {
                    name,
                    email,
                    password,
                    role,
                };
                account::cmd_users_update(state, out, &id, request).await
            }
            UsersCommands::Delete { id } => account::cmd_users_delete(state, out, &id).await,
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => account::cmd_config_show(state, out).await,
            ConfigCommands::Set { key, value } => {
                account::cmd_config_set(state, out, &key, &value).await
            }
        },
        Commands::Health { api } => account::cmd_health(state, out, api).await,
    }
}
