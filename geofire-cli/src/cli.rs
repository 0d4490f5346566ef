use clap::{Parser, Subcommand, ValueEnum};
use geofire_query::{FilterDistance, OrderBy};

/// Reference point used by the demo query (downtown Austin, TX)
pub const DEFAULT_LATITUDE: f64 = 30.2651242;
pub const DEFAULT_LONGITUDE: f64 = -97.7308078;

#[derive(Parser, Debug)]
#[command(name = "geofire", about = "GeoFire nearby-business client", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL
    #[arg(
        long,
        global = true,
        env = "GEOFIRE_SERVER_URL",
        default_value = "http://127.0.0.1:10000"
    )]
    pub server: String,

    /// Bearer token sent with every request
    #[arg(long, global = true, env = "GEOFIRE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find businesses near a point
    Nearby {
        /// Latitude in degrees
        #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_hyphen_values = true)]
        latitude: f64,

        /// Longitude in degrees
        #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_hyphen_values = true)]
        longitude: f64,

        /// Ordering preference sent to the server
        #[arg(long, value_enum, default_value = "a-to-z")]
        order_by: OrderArg,

        /// Distance filter sent to the server
        #[arg(long, value_enum, default_value = "none")]
        filter: FilterArg,

        /// Seconds to wait for the response
        #[arg(long, default_value = "60")]
        timeout_secs: u64,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Check that the server is up
    Health,

    /// Show server query counters
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Default,
    AToZ,
}

impl From<OrderArg> for OrderBy {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Default => OrderBy::Default,
            OrderArg::AToZ => OrderBy::AToZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    None,
    #[value(name = "1mi")]
    Mi1,
    #[value(name = "5mi")]
    Mi5,
    #[value(name = "10mi")]
    Mi10,
    #[value(name = "25mi")]
    Mi25,
}

impl From<FilterArg> for FilterDistance {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::None => FilterDistance::None,
            FilterArg::Mi1 => FilterDistance::Mi1,
            FilterArg::Mi5 => FilterDistance::Mi5,
            FilterArg::Mi10 => FilterDistance::Mi10,
            FilterArg::Mi25 => FilterDistance::Mi25,
        }
    }
}
