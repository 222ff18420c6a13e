//! `roombook`: book meeting rooms from the command line.
//!
//! ```sh
//! roombook login --username ada --password secret
//! roombook rooms
//! roombook slots --room 1 --day 2026-03-02
//! roombook book --room 1 --day 2026-03-02 --slot 09:00-09:30 --slot 09:30-10:00
//! roombook mine
//! roombook cancel 42
//! ```

mod output;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result, WrapErr};
use dotenv::dotenv;
use roombook_client::{BookingPanel, ClientConfig, HttpApi, Session};
use roombook_core::{
    errors::BookingError,
    models::{booking::BookingId, room::{EditRoomRequest, RoomId}, user::UserId},
};
use tracing::{debug, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "roombook", version, about = "Meeting-room booking client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "ROOMBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in with it
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "ROOMBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List rooms
    Rooms,
    /// Show a room's slots for one day
    Slots {
        #[arg(long)]
        room: RoomId,
        /// Day as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        day: Option<NaiveDate>,
    },
    /// Book a contiguous run of slots
    Book {
        #[arg(long)]
        room: RoomId,
        #[arg(long)]
        day: Option<NaiveDate>,
        /// Slot label such as 09:00-09:30, as shown by `slots`; repeat for longer bookings
        #[arg(long = "slot", required = true)]
        slots: Vec<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List your bookings
    Mine,
    /// Cancel one of your bookings before it starts
    Cancel { id: BookingId },
    /// Change your nickname
    Profile {
        #[arg(long)]
        nickname: String,
    },
    /// Change your password
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
    /// Administrator commands
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Manage rooms
    Rooms {
        #[command(subcommand)]
        command: RoomCommand,
    },
    /// List every booking
    Bookings,
    /// List every user
    Users,
    /// Set another user's password
    Password {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        new: String,
    },
    /// Show or change system settings
    Settings {
        #[arg(long)]
        allow_password_change: Option<bool>,
    },
}

#[derive(Subcommand)]
enum RoomCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        capacity: i64,
    },
    Edit {
        id: RoomId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        capacity: Option<i64>,
    },
    Delete { id: RoomId },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = ClientConfig::from_env()?;

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let session_file = config.session_file.clone();
    let api = HttpApi::new(config)?;

    // Login and register replace the stored session rather than use it.
    let uses_stored_session = !matches!(
        cli.command,
        Command::Login { .. } | Command::Register { .. } | Command::Logout
    );

    match run(cli.command, &api).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let rejected = match e.downcast_ref::<BookingError>() {
                Some(error) if uses_stored_session => {
                    Session::clear_if_rejected(&session_file, error)?
                }
                _ => false,
            };
            if rejected {
                warn!("session rejected by the server, logging out");
                return Err(e).wrap_err("Session expired, run `roombook login` again");
            }
            Err(e)
        }
    }
}

async fn run(command: Command, api: &HttpApi) -> Result<()> {
    let config = api.config();
    let today = Utc::now().with_timezone(&config.timezone).date_naive();

    match command {
        Command::Login { username, password } => {
            let session = api.login(&username, &password).await?;
            session.save(&config.session_file)?;
            if let Some(user) = session.user() {
                println!("Logged in as {}", user.display_name());
            }
        }
        Command::Register { username, password } => {
            let session = api.register(&username, &password).await?;
            session.save(&config.session_file)?;
            println!("Registered and logged in as {}", username);
        }
        Command::Logout => {
            Session::clear(&config.session_file)?;
            println!("Logged out");
        }
        Command::Whoami => {
            let session = require_session(config)?;
            let user = api.user_info(&session).await?;
            session.with_user(user.clone()).save(&config.session_file)?;
            println!("{}", output::user(&user));
        }
        Command::Rooms => {
            let session = require_session(config)?;
            let rooms = api.list_rooms(&session).await?;
            println!("{}", output::rooms(&rooms));
        }
        Command::Slots { room, day } => {
            let session = require_session(config)?;
            let mut panel = open_panel(config, day.unwrap_or(today), room);
            panel.refresh(api, &session).await?;
            println!("{}", output::slots(&panel.slot_views()));
        }
        Command::Book {
            room,
            day,
            slots,
            reason,
        } => {
            let session = require_session(config)?;
            let mut panel = open_panel(config, day.unwrap_or(today), room);
            panel.refresh(api, &session).await?;
            for label in &slots {
                panel.toggle(label)?;
            }
            debug!(count = panel.selection().len(), "slots selected");

            let booking = panel.submit(api, &session, reason).await?;
            println!(
                "Booked room {} from {} to {} (booking {})",
                booking.room_id,
                output::local_time(booking.start_time, config.timezone),
                output::local_time(booking.end_time, config.timezone),
                booking.id
            );
        }
        Command::Mine => {
            let session = require_session(config)?;
            let bookings = api.my_bookings(&session).await?;
            println!("{}", output::bookings(&bookings, config.timezone, Utc::now()));
        }
        Command::Cancel { id } => {
            let session = require_session(config)?;
            api.cancel_booking(&session, id).await?;
            println!("Cancelled booking {}", id);
        }
        Command::Profile { nickname } => {
            let mut session = require_session(config)?;
            let user = api.update_profile(&mut session, &nickname).await?;
            session.save(&config.session_file)?;
            println!("Nickname changed to {}", user.display_name());
        }
        Command::Password { old, new } => {
            let session = require_session(config)?;
            let message = api.change_password(&session, &old, &new).await?;
            println!("{}", message);
        }
        Command::Admin { command } => {
            let session = require_session(config)?;
            if !session.is_admin() {
                bail!("This command requires an administrator account");
            }
            run_admin(command, api, &session).await?;
        }
    }

    Ok(())
}

async fn run_admin(command: AdminCommand, api: &HttpApi, session: &Session) -> Result<()> {
    let tz = api.config().timezone;

    match command {
        AdminCommand::Rooms { command } => match command {
            RoomCommand::Add { name, capacity } => {
                let room = api.add_room(session, &name, capacity).await?;
                println!("Added room {} ({})", room.name, room.id);
            }
            RoomCommand::Edit { id, name, capacity } => {
                if name.is_none() && capacity.is_none() {
                    bail!("Nothing to change, pass --name or --capacity");
                }
                let room = api
                    .edit_room(session, id, &EditRoomRequest { name, capacity })
                    .await?;
                println!("{}", output::rooms(&[room]));
            }
            RoomCommand::Delete { id } => {
                api.delete_room(session, id).await?;
                println!("Deleted room {}", id);
            }
        },
        AdminCommand::Bookings => {
            let bookings = api.admin_bookings(session).await?;
            println!("{}", output::booking_details(&bookings, tz));
        }
        AdminCommand::Users => {
            let users = api.admin_users(session).await?;
            println!("{}", output::users(&users));
        }
        AdminCommand::Password { user, new } => {
            let message = api.admin_change_user_password(session, user, &new).await?;
            println!("{}", message);
        }
        AdminCommand::Settings {
            allow_password_change,
        } => {
            let settings = match allow_password_change {
                Some(allow) => api.update_settings(session, allow).await?,
                None => api.admin_settings(session).await?,
            };
            println!(
                "Users may change their password: {}",
                settings.allow_user_change_password
            );
        }
    }

    Ok(())
}

fn open_panel(config: &ClientConfig, day: NaiveDate, room: RoomId) -> BookingPanel {
    let mut panel = BookingPanel::new(day, config.timezone, config.slot_window);
    panel.select_room(room);
    panel
}

fn require_session(config: &ClientConfig) -> Result<Session> {
    let session = Session::load(&config.session_file)
        .wrap_err_with(|| format!("Reading session from {}", config.session_file.display()))?;
    match session {
        Some(session) => Ok(session),
        None => bail!("Not logged in, run `roombook login` first"),
    }
}
