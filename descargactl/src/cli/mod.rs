mod commands;
mod watch;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use descarga_model::{DocumentDirection, DocumentStatus, DocumentType, QueryId, Service};
use uuid::Uuid;

pub use commands::run;

/// Command-line client for the bulk CFDI download service.
#[derive(Parser, Debug)]
#[command(name = "descargactl", version)]
#[command(about = "Submit, track and download bulk CFDI queries")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Service root URL (overrides configuration)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Interval between status sweeps, e.g. `5s` or `1m` (overrides configuration)
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Contract RFC; defaults to $DESCARGA_RFC
    #[arg(long, global = true)]
    pub rfc: Option<String>,

    /// Contract password; defaults to $DESCARGA_PASSWORD
    #[arg(long, global = true)]
    pub password: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new query and print its id
    Submit(SubmitArgs),
    /// Show the current status of a query
    Status(QueryArgs),
    /// Show result counts of a finished query
    Summary(QueryArgs),
    /// List one page of result metadata
    Results(ResultsArgs),
    /// Print the XML of one document
    Xml(XmlArgs),
    /// Download the query archive
    Zip(ZipArgs),
    /// Ask the service to run a query again
    Repeat(RepeatArgs),
    /// Follow status changes until the query settles
    Watch(QueryArgs),
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// First issue date, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`
    #[arg(long, value_parser = parse_start)]
    pub start: NaiveDateTime,

    /// Last issue date; a bare date covers the whole day. Defaults to now
    #[arg(long, value_parser = parse_end)]
    pub end: Option<NaiveDateTime>,

    /// RFC of the SAT account to query
    #[arg(long)]
    pub sat_rfc: String,

    /// CIEC password of the SAT account
    #[arg(long)]
    pub sat_password: String,

    /// Only documents exchanged with this RFC
    #[arg(long)]
    pub search_rfc: Option<String>,

    #[arg(long, value_enum, default_value_t = StatusArg::All)]
    pub status: StatusArg,

    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    #[arg(long, value_enum, default_value_t = ServiceArg::Reporter)]
    pub service: ServiceArg,

    #[arg(long = "type", value_enum, default_value_t = TypeArg::Cfdi)]
    pub document_type: TypeArg,

    /// Keep running and report status changes until the query settles
    #[arg(long)]
    pub watch: bool,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query id returned by `submit`
    pub id: QueryId,
}

#[derive(Args, Debug)]
pub struct ResultsArgs {
    pub id: QueryId,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Print the raw metadata as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct XmlArgs {
    pub id: QueryId,

    /// Folio of the document
    pub cfdi: Uuid,

    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ZipArgs {
    pub id: QueryId,

    /// Destination file
    pub destination: PathBuf,
}

#[derive(Args, Debug)]
pub struct RepeatArgs {
    pub id: QueryId,

    /// Keep running and report status changes until the query settles
    #[arg(long)]
    pub watch: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Active,
    Canceled,
    All,
}

impl From<StatusArg> for DocumentStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Active => DocumentStatus::Active,
            StatusArg::Canceled => DocumentStatus::Canceled,
            StatusArg::All => DocumentStatus::All,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionArg {
    Issued,
    Received,
    All,
}

impl From<DirectionArg> for DocumentDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Issued => DocumentDirection::Issued,
            DirectionArg::Received => DocumentDirection::Received,
            DirectionArg::All => DocumentDirection::All,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceArg {
    Reporter,
    ApiCiec,
}

impl From<ServiceArg> for Service {
    fn from(value: ServiceArg) -> Self {
        match value {
            ServiceArg::Reporter => Service::CsReporter,
            ServiceArg::ApiCiec => Service::ApiCiec,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeArg {
    Cfdi,
    Retention,
}

impl From<TypeArg> for DocumentType {
    fn from(value: TypeArg) -> Self {
        match value {
            TypeArg::Cfdi => DocumentType::Cfdi,
            TypeArg::Retention => DocumentType::Retention,
        }
    }
}

fn parse_datetime(raw: &str, (hour, min, sec): (u32, u32, u32)) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(date_time) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(date_time);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(hour, min, sec))
        .ok_or_else(|| format!("expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, got '{raw}'"))
}

fn parse_start(raw: &str) -> Result<NaiveDateTime, String> {
    parse_datetime(raw, (0, 0, 0))
}

fn parse_end(raw: &str) -> Result<NaiveDateTime, String> {
    parse_datetime(raw, (23, 59, 59))
}
