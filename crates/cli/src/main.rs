use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sentinel_core::announcements::AnnouncementFeed;
use sentinel_core::collaborators::Coordinates;
use sentinel_core::config::guide_model_from_env_value;
use sentinel_core::constants::{
    ANNOUNCEMENTS_COLLECTION, DEFAULT_CALLING_CODE, SYMPTOM_REPORTS_COLLECTION, USERS_COLLECTION,
};
use sentinel_core::guide::HealthGuide;
use sentinel_core::qr::{QrCodes, UserQrCode};
use sentinel_core::records::UserStatus;
use sentinel_core::validation::password_strength;
use sentinel_core::{
    sign_in, CoreConfig, FlowDraft, GuideSettings, RegistrationController, RegistrationDraft,
    ReportController, ReportDraft, Session, StepMachine, SubmissionOutcome, Submitter,
};
use sentinel_services::{Collaborators, FixedLocation, ServicesConfig};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long `announcements` waits for the first snapshot.
const FIRST_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Sentinel community health reporting CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlowArg {
    Registration,
    Report,
}

#[derive(Args)]
struct Credentials {
    /// Registered mobile number, with or without the leading 0
    #[arg(long)]
    contact: String,
    #[arg(long)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which password rules a candidate password meets
    PasswordCheck { password: String },
    /// Walk a draft through its steps and print each step's errors
    Validate {
        flow: FlowArg,
        /// Draft JSON file
        draft: PathBuf,
    },
    /// Register a resident from a registration draft
    Register {
        /// Registration draft JSON file
        draft: PathBuf,
    },
    /// Sign in and show the account's review status
    Login { contact: String, password: String },
    /// Submit a symptom report
    Report {
        /// Report draft JSON file
        draft: PathBuf,
        #[command(flatten)]
        credentials: Credentials,
        /// Latitude of the report; omit to behave as if location access was denied
        #[arg(long, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
    },
    /// Ask the AI health guide a question
    Ask {
        message: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// List announcements with unread markers
    Announcements {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show the health QR code, generating it on first use
    Qr {
        #[command(flatten)]
        credentials: Credentials,
        /// Refresh the stored profile and reports, keeping the same QR id
        #[arg(long)]
        regenerate: bool,
    },
    /// Resolve a scanned QR id to the resident it belongs to
    QrLookup {
        qr_id: String,
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("sentinel=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::PasswordCheck { password } => {
            let strength = password_strength(&password);
            for (rule, ok) in strength.checklist() {
                println!("[{}] {}", if ok { "x" } else { " " }, rule);
            }
            println!(
                "{}",
                if strength.is_strong() {
                    "Password is strong."
                } else {
                    "Password does not meet the strength requirements."
                }
            );
        }
        Commands::Validate { flow, draft } => {
            let core = core_config()?;
            let valid = match flow {
                FlowArg::Registration => {
                    let mut draft: RegistrationDraft = load_draft(&draft)?;
                    walk(&mut StepMachine::new(&core), &mut draft)
                }
                FlowArg::Report => {
                    let mut draft: ReportDraft = load_draft(&draft)?;
                    walk(&mut StepMachine::new(&core), &mut draft)
                }
            };
            if !valid {
                bail!("draft is not ready to submit");
            }
            println!("All steps valid; ready to submit.");
        }
        Commands::Register { draft } => {
            let core = core_config()?;
            let mut draft: RegistrationDraft = load_draft(&draft)?;
            let mut machine = StepMachine::new(&core);
            if !walk(&mut machine, &mut draft) {
                bail!("registration draft is not ready to submit");
            }

            let c = collaborators(core.clone())?;
            let controller = RegistrationController::new(
                core,
                c.firestore.clone(),
                c.images.clone(),
                c.auth.clone(),
                c.firestore.clone(),
            );
            submit(&mut machine, &draft, &controller).await?;
            println!("Your registration is pending review by the health office.");
        }
        Commands::Login { contact, password } => {
            let core = core_config()?;
            let c = collaborators(core)?;
            let session = login(&c, &contact, &password).await?;
            println!("Signed in as {} ({})", session.display_name(), session.status());
            match session.status() {
                UserStatus::Pending => println!("Your account is awaiting approval."),
                UserStatus::Rejected => println!("Your registration was not approved."),
                UserStatus::Approved => {}
            }
        }
        Commands::Report {
            draft,
            credentials,
            lat,
            lon,
        } => {
            let core = core_config()?;
            let mut draft: ReportDraft = load_draft(&draft)?;
            let mut machine = StepMachine::new(&core);
            if !walk(&mut machine, &mut draft) {
                bail!("report draft is not ready to submit");
            }

            let c = collaborators(core.clone())?;
            let session = approved_session(&c, &credentials).await?;
            let location = FixedLocation::new(
                lat.zip(lon)
                    .map(|(latitude, longitude)| Coordinates { latitude, longitude }),
            );
            let controller = ReportController::new(
                core,
                session,
                c.images.clone(),
                Arc::new(location),
                c.geocoder.clone(),
                c.firestore.clone(),
            );
            submit(&mut machine, &draft, &controller).await?;
        }
        Commands::Ask {
            message,
            credentials,
        } => {
            let core = core_config()?;
            let c = collaborators(core.clone())?;
            let session = approved_session(&c, &credentials).await?;
            let guide = HealthGuide::new(core, c.chat.clone(), c.firestore.clone());

            let history = guide.load_history(&session, Utc::now()).await;
            let reply = guide.ask(&history, &message).await?;
            println!("{}", reply.content);
            for disease in &reply.diseases {
                println!(
                    "  {}: {}% ({:?} confidence), severity {}",
                    disease.name,
                    disease.confidence,
                    disease.band(),
                    disease.severity
                );
            }
        }
        Commands::Announcements { credentials } => {
            let core = core_config()?;
            let c = collaborators(core.clone())?;
            let session = approved_session(&c, &credentials).await?;

            let mut feed =
                AnnouncementFeed::attach(core, &session, &*c.firestore, c.firestore.clone()).await;
            let mut changes = feed.changes();
            tokio::time::timeout(FIRST_SNAPSHOT_TIMEOUT, changes.wait_for(|s| s.snapshots > 0))
                .await
                .context("timed out waiting for announcements")?
                .map(|_| ())
                .context("announcement feed closed")?;

            if let Some(latest) = feed.latest_notification() {
                println!("New: {}", latest.title);
                feed.dismiss();
            }
            for a in feed.announcements() {
                let marker = if feed.is_read(&a.id) { " " } else { "*" };
                println!(
                    "{} [{}] {} ({:?}) {}",
                    marker,
                    a.kind.label(),
                    a.title,
                    a.priority,
                    a.created_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!("Unread: {}", feed.unread_count());
            feed.detach();
        }
        Commands::Qr {
            credentials,
            regenerate,
        } => {
            let core = core_config()?;
            let c = collaborators(core.clone())?;
            let session = approved_session(&c, &credentials).await?;
            let codes = QrCodes::new(core, c.firestore.clone());

            let result = if regenerate {
                codes.generate(&session, Utc::now()).await
            } else {
                codes.load_or_generate(&session, Utc::now()).await
            };
            let issued = result.map_err(|failure| anyhow!(failure.message))?;
            print_qr(&issued.code);
            println!();
            println!("Only share this code with authorized health workers.");
        }
        Commands::QrLookup { qr_id, credentials } => {
            let core = core_config()?;
            let c = collaborators(core.clone())?;
            login(&c, &credentials.contact, &credentials.password).await?;
            let codes = QrCodes::new(core, c.firestore.clone());

            let issued = codes
                .lookup(&qr_id)
                .await
                .map_err(|failure| anyhow!(failure.message))?
                .with_context(|| format!("no QR code {}", qr_id.trim()))?;
            print_qr(&issued.code);
            for report in &issued.code.symptom_reports {
                println!(
                    "  {} {:?}: {}",
                    report.created_at.format("%Y-%m-%d"),
                    report.report_type,
                    report.symptoms.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn core_config() -> anyhow::Result<Arc<CoreConfig>> {
    let guide = GuideSettings {
        model: guide_model_from_env_value(std::env::var("SENTINEL_OPENAI_MODEL").ok()),
        ..GuideSettings::default()
    };
    let cfg = CoreConfig::new(
        USERS_COLLECTION.into(),
        SYMPTOM_REPORTS_COLLECTION.into(),
        ANNOUNCEMENTS_COLLECTION.into(),
        DEFAULT_CALLING_CODE.into(),
        guide,
    )?;
    Ok(Arc::new(cfg))
}

fn collaborators(core: Arc<CoreConfig>) -> anyhow::Result<Collaborators> {
    let cfg = ServicesConfig::from_env()?;
    Ok(Collaborators::connect(&cfg, core)?)
}

fn load_draft<D: DeserializeOwned>(path: &Path) -> anyhow::Result<D> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read draft {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse draft {}", path.display()))
}

/// Advances through every step, printing each step's result. Returns true when the final step
/// validates.
fn walk<D: FlowDraft>(machine: &mut StepMachine<D>, draft: &mut D) -> bool {
    loop {
        let step = machine.step();
        let label = machine.label();
        let result = machine.attempt_advance(draft);
        if !result.is_empty() {
            println!("Step {step} ({label}):");
            for error in result.errors() {
                println!("  - {error}");
            }
            return false;
        }
        println!("Step {step} ({label}): ok");
        if step == machine.total_steps() {
            return true;
        }
    }
}

async fn submit<D, S>(machine: &mut StepMachine<D>, draft: &D, submitter: &S) -> anyhow::Result<()>
where
    D: FlowDraft + Sync,
    S: Submitter<D>,
{
    let outcome = machine
        .attempt_submit(draft, submitter)
        .await
        .map_err(|errors| anyhow!(errors.into_errors().join("; ")))?;
    match outcome {
        SubmissionOutcome::Success(id) => {
            tracing::debug!(record = %id, "submission accepted");
            println!("Submitted: {id}");
            Ok(())
        }
        SubmissionOutcome::Failure(failure) => bail!("{}", failure.message),
        other => bail!("submission did not complete: {other:?}"),
    }
}

fn print_qr(code: &UserQrCode) {
    let user = &code.user_data;
    println!("QR ID: {}", code.qr_id);
    println!("Name: {}", user.display_name());
    println!("Contact: {}", user.contact_number);
    println!("Address: {}, {}", user.address.barangay, user.address.municipality);
    println!("Role: {}", user.community_role);
    println!("ID type: {}", user.documents.id_type);
    println!(
        "Reports: {} (updated {})",
        code.symptom_reports.len(),
        code.updated_at.format("%Y-%m-%d %H:%M")
    );
}

async fn login(c: &Collaborators, contact: &str, password: &str) -> anyhow::Result<Session> {
    sign_in(&*c.firestore, &*c.auth, contact, password)
        .await
        .map_err(|failure| anyhow!(failure.message))
}

async fn approved_session(c: &Collaborators, credentials: &Credentials) -> anyhow::Result<Session> {
    let session = login(c, &credentials.contact, &credentials.password).await?;
    if !session.is_approved() {
        bail!(
            "account for {} is {}; it must be approved first",
            session.display_name(),
            session.status()
        );
    }
    Ok(session)
}
