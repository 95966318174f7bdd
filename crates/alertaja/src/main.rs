//! `alertaja` - CLI for the AlertaJá board
//!
//! This binary reports and votes on incident alerts, publishes courier
//! availability and prints the chat links that hand off to a messaging app.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::time::Duration;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use alertaja::cli::{
    AlertsCommand, Cli, Command, ConfigCommand, CourierCommand, OutputFormat, ReportCommand,
};
use alertaja::display::{alert_age_label, courier_age_label};
use alertaja::geo::{self, FixedLocator, NominatimGeocoder, OfflineGeocoder, ReverseGeocoder};
use alertaja::map::{GeoJsonLayer, MarkerSync, PinPicker};
use alertaja::{
    init_logging, Alert, AlertBoard, AlertPolicy, AvailabilityPublisher, Config, Coordinates,
    CourierDirectory, CourierPolicy, DirectoryEntry, DisputeOutcome, Messenger, NewAlert,
    SessionHolder, Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config commands load the file they are about, not the one in effect
    if let Command::Config(config_cmd) = &cli.command {
        return handle_config(&cli, config_cmd);
    }

    let config = Config::load_from(cli.config.clone())?;

    // Commands that don't touch the board
    match &cli.command {
        Command::Regions => {
            for region in &config.town.regions {
                println!("{region}");
            }
            return Ok(());
        }
        _ => {}
    }

    let storage = Storage::open(config.database_path())?;
    let messenger = Messenger::from_config(&config)?;
    let mut session = SessionHolder::restore(&storage)?;

    if let Command::Login(login) = &cli.command {
        let Some((name, phone)) = cli.identity() else {
            bail!("login needs --name and --phone");
        };
        let user = session.login(name, phone, !login.no_remember)?;
        println!("Logged in as {} ({})", user.username, user.phone);
        return Ok(());
    }
    if let Some((name, phone)) = cli.identity() {
        session.assume(name, phone)?;
    }

    let app = App {
        config: &config,
        storage: &storage,
        messenger: &messenger,
    };

    match cli.command {
        Command::Login(_) | Command::Config(_) | Command::Regions => Ok(()),
        Command::Logout => {
            match session.logout()? {
                Some(user) => println!("Logged out {}", user.username),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Whoami => {
            match session.current() {
                Some(user) => println!("{} ({})", user.username, user.phone),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Alerts(cmd) => app.handle_alerts(&session, cmd).await,
        Command::Courier(cmd) => app.handle_courier(&session, cmd),
        Command::Status(status_cmd) => app.handle_status(&session, status_cmd.json),
    }
}

/// Everything a board command needs.
struct App<'a> {
    config: &'a Config,
    storage: &'a Storage,
    messenger: &'a Messenger,
}

impl App<'_> {
    fn board(&self) -> AlertBoard<'_> {
        AlertBoard::new(
            self.storage,
            AlertPolicy::from(&self.config.expiry),
            self.messenger,
        )
    }

    fn directory(&self) -> CourierDirectory<'_> {
        CourierDirectory::new(self.storage, CourierPolicy::from(&self.config.expiry))
    }

    async fn handle_alerts(&self, session: &SessionHolder<'_>, cmd: AlertsCommand) -> anyhow::Result<()> {
        let board = self.board();
        match cmd {
            AlertsCommand::List { format } => {
                let now = Utc::now();
                let alerts = board.list(now)?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&alerts)?),
                    OutputFormat::Plain if alerts.is_empty() => println!("No alerts"),
                    OutputFormat::Plain => {
                        for alert in &alerts {
                            self.print_alert(alert, now);
                        }
                    }
                }
            }
            AlertsCommand::Report(report_cmd) => {
                let user = session.require()?.username.clone();
                self.handle_report(&board, user, report_cmd).await?;
            }
            AlertsCommand::Confirm { id } => {
                board.confirm(session.require()?, &id, Utc::now())?;
                println!("Confirmed alert {id}");
            }
            AlertsCommand::Dispute { id } => {
                let voter = session.require()?;
                match board.dispute(voter, &id, Utc::now())? {
                    DisputeOutcome::Counted { votes } => println!(
                        "Vote recorded ({votes}/{})",
                        self.config.expiry.dispute_threshold
                    ),
                    DisputeOutcome::Removed => println!("Alert {id} removed"),
                }
            }
            AlertsCommand::Sweep => {
                let removed = board.sweep(Utc::now())?;
                println!("Removed {removed} expired alerts");
            }
            AlertsCommand::Map { output } => {
                let mut markers = MarkerSync::new(GeoJsonLayer::new());
                let now = Utc::now();
                markers.sync(&board.list(now)?, now);
                let rendered = serde_json::to_string_pretty(&markers.layer().to_feature_collection())?;
                match output {
                    Some(path) => std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?,
                    None => println!("{rendered}"),
                }
            }
            AlertsCommand::Watch { interval } => {
                let period = interval.map_or_else(|| self.config.sweep_interval(), Duration::from_secs);
                if period.is_zero() {
                    bail!("sweep interval must be at least one second");
                }
                watch(&board, period).await?;
            }
        }
        Ok(())
    }

    async fn handle_report(
        &self,
        board: &AlertBoard<'_>,
        user: String,
        cmd: ReportCommand,
    ) -> anyhow::Result<()> {
        let mut picker = PinPicker::new(self.config.town.default_location());
        let pin = match (cmd.lat, cmd.lng) {
            (Some(lat), Some(lng)) => picker.move_to(Coordinates::new(lat, lng)),
            _ => {
                let locator = FixedLocator::new(self.config.device.position);
                picker.locate(&locator, self.config.locate_timeout()).await
            }
        };

        let street = match cmd.street {
            Some(street) => street,
            None => {
                let geocoder = self.geocoder()?;
                geo::resolve_street_label(geocoder.as_ref(), pin.position).await
            }
        };
        picker.apply_label(pin, street);

        let report = board.report(
            NewAlert {
                alert_type: cmd.alert_type.into(),
                location: Some(picker.position()),
                street: picker.label().unwrap_or_default().to_string(),
                description: cmd.description,
                user,
            },
            Utc::now(),
        )?;

        match cmd.format {
            OutputFormat::Json => {
                let out = serde_json::json!({
                    "alert": report.alert,
                    "share_link": report.share_link.as_str(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Plain => {
                println!(
                    "Reported {} at {} (id {})",
                    report.alert.alert_type.label(),
                    report.alert.street,
                    report.alert.id
                );
                println!("Share: {}", report.share_link);
            }
        }
        Ok(())
    }

    fn geocoder(&self) -> anyhow::Result<Box<dyn ReverseGeocoder>> {
        if self.config.geocoding.enabled {
            Ok(Box::new(NominatimGeocoder::new(&self.config.geocoding)?))
        } else {
            Ok(Box::new(OfflineGeocoder))
        }
    }

    fn print_alert(&self, alert: &Alert, now: chrono::DateTime<Utc>) {
        println!(
            "{}  {}  {}",
            alert.id,
            alert.alert_type.label(),
            alert_age_label(alert.created_at, now)
        );
        println!("    {}", alert.street);
        if !alert.description.is_empty() {
            println!("    {}", alert.description);
        }
        println!(
            "    por {} · votos {}/{}",
            alert.user, alert.votes, self.config.expiry.dispute_threshold
        );
    }

    fn handle_courier(&self, session: &SessionHolder<'_>, cmd: CourierCommand) -> anyhow::Result<()> {
        let policy = CourierPolicy::from(&self.config.expiry);
        match cmd {
            CourierCommand::Status { format } => {
                let user = session.require()?;
                let publisher = AvailabilityPublisher::new(self.storage, policy, &self.config.town);
                let status = publisher.load_own_status(&user.phone, Utc::now())?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                    OutputFormat::Plain => match &status.region {
                        Some(region) if status.is_available => {
                            println!("Available in {region}");
                        }
                        _ => println!("Offline"),
                    },
                }
            }
            CourierCommand::Toggle { region } => {
                let user = session.require()?;
                let publisher = AvailabilityPublisher::new(self.storage, policy, &self.config.town);
                let status = publisher.toggle_availability(user, region.as_deref(), Utc::now())?;
                match status.region {
                    Some(region) if status.is_available => {
                        println!("Você está visível para corridas em {region}!");
                    }
                    _ => println!("Offline"),
                }
            }
            CourierCommand::Find { filter, format } => {
                let now = Utc::now();
                let couriers = self.directory().list(&filter, now)?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&couriers)?),
                    OutputFormat::Plain if couriers.is_empty() => {
                        println!("No couriers available");
                    }
                    OutputFormat::Plain => {
                        for courier in &couriers {
                            print_courier(courier, now);
                        }
                    }
                }
            }
            CourierCommand::Contact { phone } => {
                let courier = self.directory().find(&phone, Utc::now())?;
                let link = self.messenger.courier_contact(&courier)?;
                println!("{link}");
            }
        }
        Ok(())
    }

    fn handle_status(&self, session: &SessionHolder<'_>, json: bool) -> anyhow::Result<()> {
        let now = Utc::now();
        let alerts = self.board().list(now)?.len();
        let couriers = self.directory().live(now)?.len();
        let stats = self.storage.stats()?;
        let user = session.current();

        if json {
            let status = serde_json::json!({
                "town": self.config.town.name,
                "user": user,
                "live_alerts": alerts,
                "available_couriers": couriers,
                "database_path": self.storage.path(),
                "total_keys": stats.total_keys,
                "last_write": stats.last_write,
                "db_size_bytes": stats.db_size_bytes,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!("alertaja status");
            println!("---------------");
            println!("Town:          {}", self.config.town.name);
            match user {
                Some(user) => println!("User:          {} ({})", user.username, user.phone),
                None => println!("User:          not logged in"),
            }
            println!("Live alerts:   {alerts}");
            println!("Couriers:      {couriers}");
            println!("Database:      {}", self.storage.path().display());
            println!("Stored keys:   {}", stats.total_keys);
            println!("Size:          {} bytes", stats.db_size_bytes);
            if let Some(last) = stats.last_write {
                println!("Last write:    {}", last.to_rfc3339());
            }
        }
        Ok(())
    }
}

fn print_courier(courier: &DirectoryEntry, now: chrono::DateTime<Utc>) {
    println!(
        "{}  {}  {}  ({})",
        courier.username,
        courier.phone,
        courier.region,
        courier_age_label(courier.last_updated, now)
    );
}

async fn watch(board: &AlertBoard<'_>, period: Duration) -> anyhow::Result<()> {
    info!("Sweeping expired alerts every {:?}", period);
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = board.sweep(Utc::now())?;
                if removed > 0 {
                    println!("Removed {removed} expired alerts");
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("Cannot listen for Ctrl-C: {}", e);
                }
                info!("Stopping sweep loop");
                return Ok(());
            }
        }
    }
}

fn handle_config(cli: &Cli, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = &Config::load_from(cli.config.clone())?;
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Town]");
                println!("  Name:               {}", config.town.name);
                println!("  Default location:   {}", config.town.default_location());
                println!("  Regions:            {}", config.town.regions.join(", "));
                println!();
                println!("[Expiry]");
                println!(
                    "  Alert lifetime:     {} min",
                    config.expiry.alert_lifetime_minutes
                );
                println!(
                    "  Courier lifetime:   {} min",
                    config.expiry.courier_lifetime_minutes
                );
                println!("  Dispute threshold:  {}", config.expiry.dispute_threshold);
                println!("  Sweep interval:     {} s", config.expiry.sweep_interval_secs);
                println!();
                println!("[Geocoding]");
                println!("  Enabled:            {}", config.geocoding.enabled);
                println!("  Endpoint:           {}", config.geocoding.endpoint);
                println!();
                println!("[Messaging]");
                println!("  Base URL:           {}", config.messaging.base_url);
                println!("  Country code:       {}", config.messaging.country_code);
            }
        }
        ConfigCommand::Path => {
            println!("{}", cli.config_path().display());
        }
        ConfigCommand::Validate { .. } => {
            let path = cli.validation_target().unwrap_or_else(|| cli.config_path());
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
