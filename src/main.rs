use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use eventdesk::config::ConfigManager;
use eventdesk::models::{
    Attendee, AttendeeDraft, CalendarEntry, Event, EventDraft, RecordId, Task, TaskDraft,
    TaskStatus,
};
use eventdesk::resources::{ListSource, Resource};
use eventdesk::{Credentials, Desk, DeskError, ListView, Registration, ViewOutcome};

#[derive(Parser)]
#[command(name = "eventdesk", version, about = "Manage events, attendees and tasks")]
struct Cli {
    /// Print JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    /// Only show items whose name contains this text (case-insensitive)
    #[arg(long, global = true)]
    search: Option<String>,
    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the configured API root
    #[arg(long, global = true)]
    api_root: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
    },
    /// Create an account, then sign in with it
    Register {
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long, default_value = "")]
        confirm_password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    Events {
        #[command(subcommand)]
        command: EventCommand,
    },
    Attendees {
        #[command(subcommand)]
        command: AttendeeCommand,
    },
    Tasks {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Subcommand)]
enum EventCommand {
    List,
    Add(EventFields),
    Edit {
        id: String,
        #[command(flatten)]
        fields: EventFields,
    },
    Delete {
        id: String,
    },
    /// Events as calendar entries
    Calendar,
    AddAttendee {
        event: String,
        attendee: String,
    },
}

#[derive(Args)]
struct EventFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

impl EventFields {
    fn apply(self, draft: &mut EventDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
    }
}

#[derive(Subcommand)]
enum AttendeeCommand {
    List,
    Add(AttendeeFields),
    Edit {
        id: String,
        #[command(flatten)]
        fields: AttendeeFields,
    },
    Delete {
        id: String,
    },
    /// Events the attendee is registered for
    Events {
        id: String,
    },
}

#[derive(Args)]
struct AttendeeFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Event id to link; repeat for several
    #[arg(long = "event")]
    events: Vec<String>,
}

impl AttendeeFields {
    fn apply(self, draft: &mut AttendeeDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(email) = self.email {
            draft.email = email;
        }
        for event in self.events {
            draft.add_event(RecordId::from(event));
        }
    }
}

#[derive(Subcommand)]
enum TaskCommand {
    List,
    Add {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        event: Option<String>,
        #[arg(long, default_value = "pending")]
        status: TaskStatus,
    },
    /// Flip a task between Pending and Completed
    Toggle {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file if it exists
    let env_file_path = dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "eventdesk=debug,warn".into()
            } else {
                "eventdesk=info,warn".into()
            }
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    match env_file_path {
        Some(path) => info!("Loaded environment variables from {}", path.display()),
        None => debug!("No .env file found. Using existing environment variables."),
    };

    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path).await?,
        None => ConfigManager::new().await?,
    };
    let mut config = manager.get_config().await;
    if let Some(root) = cli.api_root.clone() {
        config.api.root_url = root;
    }

    let desk = Desk::open(&config).await?;
    if let Some(term) = &cli.search {
        desk.search.set_term(term.clone());
    }

    run(&desk, cli.command, cli.json).await
}

async fn run(desk: &Desk, command: Command, json: bool) -> Result<ExitCode> {
    match command {
        Command::Login { username, password } => {
            let credentials = Credentials::new(username, password);
            Ok(report(desk.session.sign_in(&credentials).await.map(|_| ()), "Logged in"))
        }
        Command::Register {
            username,
            password,
            confirm_password,
        } => {
            let registration = Registration::new(username, password, confirm_password);
            Ok(report(
                desk.session.register(&registration).await.map(|_| ()),
                "Account created, logged in",
            ))
        }
        Command::Logout => {
            desk.session.logout().await?;
            println!("Logged out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let state = desk.session.state().await?;
            if json {
                print_json(&state)?;
            } else {
                println!("{:?}", state);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Events { command } => signed_in(desk, run_events(desk, command, json)).await,
        Command::Attendees { command } => {
            signed_in(desk, run_attendees(desk, command, json)).await
        }
        Command::Tasks { command } => signed_in(desk, run_tasks(desk, command, json)).await,
    }
}

/// Run `action` only when a session is stored
async fn signed_in(desk: &Desk, action: impl Future<Output = Result<ExitCode>>) -> Result<ExitCode> {
    if !desk.session.is_authenticated().await? {
        eprintln!("Not logged in. Run `eventdesk login` first.");
        return Ok(ExitCode::from(2));
    }
    action.await
}

async fn run_events(desk: &Desk, command: EventCommand, json: bool) -> Result<ExitCode> {
    let mut view = desk.events_view();

    match command {
        EventCommand::List => list(&mut view, json, print_events).await,
        EventCommand::Calendar => {
            let outcome = view.refresh().await;
            if !outcome.is_done() {
                return Ok(finish(outcome));
            }
            let entries = view.calendar();
            if json {
                print_json(&entries)?;
            } else {
                print_calendar(&entries);
            }
            Ok(ExitCode::SUCCESS)
        }
        EventCommand::Add(fields) => {
            let mut draft = EventDraft::default();
            fields.apply(&mut draft);
            let outcome = view.create(&draft).await;
            show_last(&view, outcome, json, print_events)
        }
        EventCommand::Edit { id, fields } => {
            let id = RecordId::from(id);
            let outcome = view.refresh().await;
            if !outcome.is_done() {
                return Ok(finish(outcome));
            }
            let mut draft = match view.find(&id) {
                Some(event) => EventDraft::from(event),
                None => return Ok(not_found("event", &id)),
            };
            fields.apply(&mut draft);
            let outcome = view.update(&id, &draft).await;
            Ok(finish_with(outcome, "Event updated"))
        }
        EventCommand::Delete { id } => {
            let outcome = view.delete(&RecordId::from(id)).await;
            Ok(finish_with(outcome, "Event deleted"))
        }
        EventCommand::AddAttendee { event, attendee } => {
            let outcome = view
                .add_attendee(&RecordId::from(event), &RecordId::from(attendee))
                .await;
            Ok(finish_with(outcome, "Attendee added"))
        }
    }
}

async fn run_attendees(desk: &Desk, command: AttendeeCommand, json: bool) -> Result<ExitCode> {
    let mut view = desk.attendees_view();

    match command {
        AttendeeCommand::List => list(&mut view, json, print_attendees).await,
        AttendeeCommand::Add(fields) => {
            let mut draft = AttendeeDraft::default();
            fields.apply(&mut draft);
            let outcome = view.create(&draft).await;
            show_last(&view, outcome, json, print_attendees)
        }
        AttendeeCommand::Edit { id, fields } => {
            let id = RecordId::from(id);
            let outcome = view.refresh().await;
            if !outcome.is_done() {
                return Ok(finish(outcome));
            }
            let mut draft = match view.find(&id) {
                Some(attendee) => AttendeeDraft::from(attendee),
                None => return Ok(not_found("attendee", &id)),
            };
            fields.apply(&mut draft);
            let outcome = view.update(&id, &draft).await;
            Ok(finish_with(outcome, "Attendee updated"))
        }
        AttendeeCommand::Delete { id } => {
            let outcome = view.delete(&RecordId::from(id)).await;
            Ok(finish_with(outcome, "Attendee deleted"))
        }
        AttendeeCommand::Events { id } => {
            match desk.resource::<Attendee>().events_of(&RecordId::from(id)).await {
                Ok(events) => {
                    let visible = desk.search.filter(&events);
                    if json {
                        print_json(&visible)?;
                    } else {
                        print_events(&visible);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => handle_error(desk, e).await,
            }
        }
    }
}

async fn run_tasks(desk: &Desk, command: TaskCommand, json: bool) -> Result<ExitCode> {
    let mut view = desk.tasks_view();

    match command {
        TaskCommand::List => list(&mut view, json, print_tasks).await,
        TaskCommand::Add {
            name,
            event,
            status,
        } => {
            let draft = TaskDraft {
                name,
                event: event.map(RecordId::from),
                status,
            };
            let outcome = view.create(&draft).await;
            show_last(&view, outcome, json, print_tasks)
        }
        TaskCommand::Toggle { id } => {
            let id = RecordId::from(id);
            let outcome = view.refresh().await;
            if !outcome.is_done() {
                return Ok(finish(outcome));
            }
            let outcome = view.toggle_status(&id).await;
            if outcome.is_done() {
                if let Some(task) = view.find(&id) {
                    println!("Task {} is now {}", task.id, task.status);
                }
            }
            Ok(finish(outcome))
        }
    }
}

async fn list<R: Resource>(
    view: &mut ListView<R>,
    json: bool,
    print: fn(&[&R]),
) -> Result<ExitCode> {
    let outcome = view.refresh().await;
    if !outcome.is_done() {
        return Ok(finish(outcome));
    }
    if view.source() == Some(ListSource::Cache) {
        eprintln!("Server unavailable, showing the last saved {}", R::PLURAL);
    }
    let visible = view.visible();
    if json {
        print_json(&visible)?;
    } else {
        print(&visible);
    }
    Ok(ExitCode::SUCCESS)
}

/// Print the item a create just appended
fn show_last<R: Resource>(
    view: &ListView<R>,
    outcome: ViewOutcome,
    json: bool,
    print: fn(&[&R]),
) -> Result<ExitCode> {
    if !outcome.is_done() {
        return Ok(finish(outcome));
    }
    if let Some(created) = view.items().last() {
        if json {
            print_json(created)?;
        } else {
            print(&[created]);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_error(desk: &Desk, error: DeskError) -> Result<ExitCode> {
    if desk.session.end_session_on_auth_failure(&error).await? {
        return Ok(finish(ViewOutcome::LoginRequired));
    }
    Ok(finish(ViewOutcome::Failed(error.user_message())))
}

fn report(result: Result<(), DeskError>, success: &str) -> ExitCode {
    match result {
        Ok(()) => {
            println!("{}", success);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn finish_with(outcome: ViewOutcome, success: &str) -> ExitCode {
    if outcome.is_done() {
        println!("{}", success);
    }
    finish(outcome)
}

fn finish(outcome: ViewOutcome) -> ExitCode {
    match outcome {
        ViewOutcome::Done => ExitCode::SUCCESS,
        ViewOutcome::Failed(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        ViewOutcome::LoginRequired => {
            eprintln!("Your session has ended. Run `eventdesk login` to sign in again.");
            ExitCode::from(2)
        }
    }
}

fn not_found(noun: &str, id: &RecordId) -> ExitCode {
    eprintln!("No {} with id {}", noun, id);
    ExitCode::FAILURE
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_events(events: &[&Event]) {
    if events.is_empty() {
        println!("No events");
        return;
    }
    println!("{:<6} {:<28} {:<22} {:<20} {:>9}", "ID", "NAME", "DATE", "LOCATION", "ATTENDEES");
    for event in events {
        println!(
            "{:<6} {:<28} {:<22} {:<20} {:>9}",
            event.id, event.name, event.date, event.location, event.attendees_count
        );
    }
}

fn print_calendar(entries: &[CalendarEntry]) {
    for entry in entries {
        println!("{}  {} (#{})", entry.start, entry.title, entry.id);
    }
}

fn print_attendees(attendees: &[&Attendee]) {
    if attendees.is_empty() {
        println!("No attendees");
        return;
    }
    println!("{:<6} {:<24} {:<32} {}", "ID", "NAME", "EMAIL", "EVENTS");
    for attendee in attendees {
        let events: Vec<String> = attendee.events.iter().map(|e| e.to_string()).collect();
        println!(
            "{:<6} {:<24} {:<32} {}",
            attendee.id,
            attendee.name,
            attendee.email,
            events.join(",")
        );
    }
}

fn print_tasks(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks");
        return;
    }
    println!("{:<6} {:<32} {:<8} {}", "ID", "TASK", "EVENT", "STATUS");
    for task in tasks {
        let event = task
            .event
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<6} {:<32} {:<8} {}", task.id, task.name, event, task.status);
    }
}
