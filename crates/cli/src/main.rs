use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use shelf_app::modules::books::validation::parse_tags;
use shelf_app::utils::{describe_gateway_error, detail_rows};
use shelf_app::{AppState, BookDraft, BookId, BookKind, BookRecord, SearchCriteria, SessionError};
use shelf_authz::AuthSession;
use shelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Book catalog console")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the local console server
    Serve,
    #[command(flatten)]
    Console(ConsoleCommand),
}

#[derive(Debug, Subcommand)]
enum ConsoleCommand {
    /// Exchange credentials for a bearer token and persist it
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "SHELF_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the persisted token
    Logout,
    /// Show login state and write access
    Whoami,
    /// Search the catalog
    Search(SearchArgs),
    /// Show one book
    Show { id: BookId },
    /// Create a book (write access)
    Create(CreateArgs),
    /// Edit a book (write access)
    Update(UpdateArgs),
    /// Delete a book (write access)
    Delete { id: BookId },
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Substring of the id
    #[arg(long)]
    id: Option<String>,
    /// Substring of the title
    #[arg(long)]
    title: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=5))]
    rating: Option<u8>,
    /// Comma-separated; a book matches when it has any of them
    #[arg(long)]
    tags: Option<String>,
    #[arg(long)]
    category: Option<BookKind>,
    /// Only books that are available
    #[arg(long)]
    available: bool,
}

impl From<SearchArgs> for SearchCriteria {
    fn from(args: SearchArgs) -> Self {
        SearchCriteria {
            id: args.id,
            title: args.title,
            rating: args.rating,
            tags: args.tags.as_deref().map(parse_tags).unwrap_or_default(),
            kind: args.category,
            available_only: args.available,
        }
    }
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[arg(long)]
    isbn: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    subtitle: Option<String>,
    #[arg(long, default_value_t = BookKind::Hardcover)]
    category: BookKind,
    #[arg(long, default_value_t = 1)]
    rating: u8,
    #[arg(long, default_value_t = 0.0)]
    price: f64,
    /// Fraction between 0 and 1
    #[arg(long, default_value_t = 0.0)]
    discount: f64,
    #[arg(long)]
    available: bool,
    /// yyyy-mm-dd
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    homepage: Option<String>,
    #[arg(long)]
    tags: Option<String>,
}

impl From<CreateArgs> for BookDraft {
    fn from(args: CreateArgs) -> Self {
        BookDraft {
            isbn: args.isbn,
            title: args.title,
            subtitle: args.subtitle,
            kind: args.category,
            rating: args.rating,
            price: args.price,
            discount: args.discount,
            available: args.available,
            release_date: args.date,
            homepage: args.homepage,
            tags: args.tags.as_deref().map(parse_tags).unwrap_or_default(),
        }
    }
}

/// Fields left out keep the values loaded from the catalog.
#[derive(Debug, Args)]
struct UpdateArgs {
    id: BookId,
    #[arg(long)]
    isbn: Option<String>,
    #[arg(long)]
    category: Option<BookKind>,
    #[arg(long)]
    rating: Option<u8>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    discount: Option<f64>,
    #[arg(long)]
    available: Option<bool>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    homepage: Option<String>,
    #[arg(long)]
    tags: Option<String>,
}

impl UpdateArgs {
    fn apply(&self, record: &BookRecord) -> BookDraft {
        let mut draft = BookDraft::from(record);
        if let Some(isbn) = &self.isbn {
            draft.isbn = isbn.clone();
        }
        if let Some(kind) = self.category {
            draft.kind = kind;
        }
        if let Some(rating) = self.rating {
            draft.rating = rating;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(discount) = self.discount {
            draft.discount = discount;
        }
        if let Some(available) = self.available {
            draft.available = available;
        }
        if let Some(date) = &self.date {
            draft.release_date = Some(date.clone());
        }
        if let Some(homepage) = &self.homepage {
            draft.homepage = Some(homepage.clone());
        }
        if let Some(tags) = &self.tags {
            draft.tags = parse_tags(tags);
        }
        draft
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry);
    tracing::debug!(env = ?settings.environment, "shelf cli starting");

    match cli.command {
        Command::Serve => shelf_app::bootstrap::run(settings).await,
        Command::Console(command) => {
            let state = AppState::from_settings(&settings)?;
            execute(command, &state).await
        }
    }
}

async fn execute(command: ConsoleCommand, state: &AppState) -> anyhow::Result<()> {
    match command {
        ConsoleCommand::Login { username, password } => {
            if !state.auth.login(&username, &password).await {
                bail!("login failed");
            }
            print_session(&state.auth.session());
        }
        ConsoleCommand::Logout => {
            state.auth.logout();
            println!("logged out");
        }
        ConsoleCommand::Whoami => print_session(&state.auth.session()),
        ConsoleCommand::Search(args) => match state.session.search(args.into()).await {
            Ok(found) => {
                for book in &found {
                    println!(
                        "{:>5}  {:<40}  {}  {:<12}  {}",
                        book.id,
                        book.title.title,
                        shelf_app::utils::render_stars(book.rating),
                        book.kind,
                        book.tags.join(", ")
                    );
                }
                println!("{} book(s)", found.len());
            }
            Err(SessionError::NoResults) => println!("no books match the search criteria"),
            Err(err) => return Err(report(err)),
        },
        ConsoleCommand::Show { id } => {
            let record = state.session.find(id).await.map_err(report)?;
            for (label, value) in detail_rows(&record) {
                println!("{label:<14}{value}");
            }
        }
        ConsoleCommand::Create(args) => {
            let id = state.session.create(args.into()).await.map_err(report)?;
            println!("created book {id}");
        }
        ConsoleCommand::Update(args) => {
            let record = state.session.find(args.id).await.map_err(report)?;
            let draft = args.apply(&record);
            let version = state
                .session
                .update(record.id, record.version, draft)
                .await
                .map_err(report)?;
            println!("updated book {} to version {version}", record.id);
        }
        ConsoleCommand::Delete { id } => {
            state.session.delete(id).await.map_err(report)?;
            println!("deleted book {id}");
        }
    }
    Ok(())
}

fn print_session(session: &AuthSession) {
    if !session.logged_in {
        println!("not logged in");
        return;
    }
    println!(
        "logged in as {} (write access: {})",
        session.username.as_deref().unwrap_or("unknown user"),
        if session.write_access { "yes" } else { "no" }
    );
}

fn report(err: SessionError) -> anyhow::Error {
    match err {
        SessionError::Gateway(err) => anyhow::anyhow!(describe_gateway_error(&err)),
        SessionError::Forbidden => anyhow::anyhow!("access denied: log in with write access first"),
        other => anyhow::Error::new(other),
    }
}
