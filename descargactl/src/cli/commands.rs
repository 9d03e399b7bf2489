use std::io::Write;

use anyhow::{Context, Result};
use descarga_config::{ClientConfig, load_contract_credentials};
use descarga_core::{DescargaClient, QueryHandle};
use descarga_model::{CfdiMeta, Credentials, SearchParams};
use tracing::{debug, info};

use super::watch;
use super::{
    Cli, Command, ConnectionArgs, QueryArgs, RepeatArgs, ResultsArgs, SubmitArgs, XmlArgs,
    ZipArgs,
};

pub async fn run(cli: Cli) -> Result<()> {
    let needs_contract = matches!(cli.command, Command::Submit(_) | Command::Repeat(_));
    let client = connect(&cli.connection, needs_contract)?;

    let outcome = match cli.command {
        Command::Submit(args) => submit(&client, args).await,
        Command::Status(args) => status(&client, args).await,
        Command::Summary(args) => summary(&client, args).await,
        Command::Results(args) => results(&client, args).await,
        Command::Xml(args) => xml(&client, args).await,
        Command::Zip(args) => zip(&client, args).await,
        Command::Repeat(args) => repeat(&client, args).await,
        Command::Watch(args) => watch_query(&client, args).await,
    };

    client.shutdown().await;
    outcome
}

fn connect(args: &ConnectionArgs, needs_contract: bool) -> Result<DescargaClient> {
    let (mut config, source) =
        ClientConfig::load_from_env().context("failed to load client configuration")?;
    debug!(?source, "configuration source");

    if let Some(base_url) = args.base_url.as_deref() {
        config.base_url = base_url.trim().to_string();
    }
    if let Some(interval) = args.poll_interval {
        config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    }
    config.validate().context("invalid client configuration")?;

    let credentials = contract_credentials(args, needs_contract)?;
    DescargaClient::new(&config, credentials).context("failed to create download client")
}

/// Read-only commands never send the contract credentials, so they may be
/// absent there.
fn contract_credentials(args: &ConnectionArgs, required: bool) -> Result<Credentials> {
    if let (Some(rfc), Some(password)) = (args.rfc.as_deref(), args.password.as_deref()) {
        return Ok(Credentials::new(rfc.trim(), password));
    }

    match load_contract_credentials() {
        Ok(credentials) => Ok(credentials),
        Err(err) if required => {
            Err(err).context("contract credentials are required (--rfc/--password)")
        }
        Err(err) => {
            debug!(error = %err, "continuing without contract credentials");
            Ok(Credentials::new("", ""))
        }
    }
}

async fn submit(client: &DescargaClient, args: SubmitArgs) -> Result<()> {
    let mut builder = SearchParams::builder()
        .start(args.start)
        .status(args.status.into())
        .service(args.service.into())
        .document_type(args.document_type.into())
        .sat_credentials(Credentials::new(args.sat_rfc.trim(), args.sat_password));
    if let Some(end) = args.end {
        builder = builder.end(end);
    }
    if let Some(direction) = args.direction {
        builder = builder.direction(direction.into());
    }
    if let Some(rfc) = args.search_rfc {
        builder = builder.search_rfc(rfc);
    }
    let params = builder.build().context("invalid search parameters")?;

    if args.watch {
        let (listener, events) = watch::channel();
        let query = client.submit_with_listener(params, listener).await?;
        println!("{}", query.id());
        settle(&query, events).await
    } else {
        let query = client.submit(params).await?;
        println!("{}", query.id());
        Ok(())
    }
}

async fn status(client: &DescargaClient, args: QueryArgs) -> Result<()> {
    let query = client.lookup(args.id).await?;
    let progress = query.progress().await?;
    println!("status: {}", progress.status);
    println!("found:  {}", progress.found);
    Ok(())
}

async fn summary(client: &DescargaClient, args: QueryArgs) -> Result<()> {
    let query = client.lookup(args.id).await?;
    print_summary(&query).await
}

async fn print_summary(query: &QueryHandle) -> Result<()> {
    let summary = query.summary().await?;
    println!("total:       {}", summary.total);
    println!("pages:       {}", summary.pages);
    println!("canceled:    {}", summary.canceled);
    println!("missing xml: {}", if summary.has_missing_xml { "yes" } else { "no" });
    Ok(())
}

async fn results(client: &DescargaClient, args: ResultsArgs) -> Result<()> {
    let query = client.lookup(args.id).await?;
    let page = query.results(args.page).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    for cfdi in &page {
        println!("{}", format_row(cfdi));
    }
    Ok(())
}

fn format_row(cfdi: &CfdiMeta) -> String {
    let rfc = |entity: &Option<descarga_model::FiscalEntity>| {
        entity
            .as_ref()
            .map(|entity| entity.rfc.clone())
            .unwrap_or_else(|| "-".to_string())
    };
    let issued = cfdi
        .issued_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let total = cfdi
        .total
        .map(|total| total.to_string())
        .unwrap_or_else(|| "-".to_string());
    let state = if cfdi.is_canceled() { "canceled" } else { "active" };

    format!(
        "{}  {}  {:>13} -> {:<13}  {:>14}  {}",
        cfdi.folio,
        issued,
        rfc(&cfdi.issuer),
        rfc(&cfdi.receiver),
        total,
        state
    )
}

async fn xml(client: &DescargaClient, args: XmlArgs) -> Result<()> {
    let query = client.lookup(args.id).await?;
    let Some(xml) = query.xml(args.cfdi).await? else {
        eprintln!("document {} has no XML", args.cfdi);
        return Ok(());
    };

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, xml.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "xml saved");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{xml}")?;
        }
    }
    Ok(())
}

async fn zip(client: &DescargaClient, args: ZipArgs) -> Result<()> {
    let query = client.lookup(args.id).await?;
    let bytes = query
        .download_zip(&args.destination)
        .await
        .with_context(|| format!("failed to download archive to {}", args.destination.display()))?;
    println!("{} bytes written to {}", bytes, args.destination.display());
    Ok(())
}

async fn repeat(client: &DescargaClient, args: RepeatArgs) -> Result<()> {
    if args.watch {
        let (listener, events) = watch::channel();
        let query = client.repeat_with_listener(args.id, listener).await?;
        settle(&query, events).await
    } else {
        let query = client.repeat(args.id).await?;
        println!("{} repeated", query.id());
        Ok(())
    }
}

async fn watch_query(client: &DescargaClient, args: QueryArgs) -> Result<()> {
    let (listener, events) = watch::channel();
    let query = client.lookup_with_listener(args.id, listener).await?;
    settle(&query, events).await
}

async fn settle(
    query: &QueryHandle,
    events: tokio::sync::mpsc::UnboundedReceiver<watch::WatchEvent>,
) -> Result<()> {
    let last = watch::follow(query, events).await?;
    match last {
        Some(status) if status.is_finished() && !status.is_failed() => print_summary(query).await,
        Some(status) if status.is_repeat() => {
            println!("query asks to be repeated again: descargactl repeat {}", query.id());
            Ok(())
        }
        _ => Ok(()),
    }
}
