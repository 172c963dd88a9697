use chart_ranker::error::Result;
use chart_ranker::models::{ArtistEntryCount, ChartEntry, SearchTermCount};
use chart_ranker::{App, AppError, Config, Dashboard};

enum Command {
    Dashboard,
    Refresh,
    Search(String),
    Artist(String),
    TopTerms(Option<usize>),
    TopArtists(Option<usize>),
    Chart,
}

fn parse_args(args: &[String]) -> Result<(Command, bool)> {
    let json = args.iter().any(|a| a == "--json");
    let rest: Vec<&String> = args.iter().skip(1).filter(|a| *a != "--json").collect();

    let value = |i: usize| rest.get(i).map(|s| s.to_string());
    let count = |i: usize| -> Result<Option<usize>> {
        match rest.get(i) {
            Some(n) => n
                .parse()
                .map(Some)
                .map_err(|_| AppError::Config(format!("not a count: {}", n))),
            None => Ok(None),
        }
    };

    let command = match rest.first().map(|s| s.as_str()) {
        None => Command::Dashboard,
        Some("--refresh") => Command::Refresh,
        Some("--chart") => Command::Chart,
        Some("--search") => Command::Search(
            value(1).ok_or_else(|| AppError::Config("--search needs a query".to_string()))?,
        ),
        Some("--artist") => Command::Artist(
            value(1).ok_or_else(|| AppError::Config("--artist needs a query".to_string()))?,
        ),
        Some("--top-terms") => Command::TopTerms(count(1)?),
        Some("--top-artists") => Command::TopArtists(count(1)?),
        Some(other) => return Err(AppError::Config(format!("unknown argument: {}", other))),
    };

    Ok((command, json))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let (command, json) = parse_args(&args)?;

    let config = Config::load()?;
    let app = App::new(&config).await?;
    let limit = app.leaderboard_limit();

    match command {
        Command::Dashboard => {
            let dashboard = app.dashboard().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print_dashboard(&dashboard);
            }
        }
        Command::Refresh => {
            let report = app.refresh_chart().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "Stored {} chart entries at {}",
                    report.stored,
                    report.refreshed_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
        Command::Search(query) => {
            let posts = app.search(&query).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&posts)?);
            } else if posts.is_empty() {
                println!("No results for {:?}", query);
            } else {
                for post in posts {
                    println!("{}\n  {}\n  {}", post.title, post.description, post.link);
                }
            }
        }
        Command::Artist(query) => {
            let entries = app.find_by_artist(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_entries(&entries);
            }
        }
        Command::TopTerms(n) => {
            let terms = app.top_search_terms(n.unwrap_or(limit)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&terms)?);
            } else {
                print_terms(&terms);
            }
        }
        Command::TopArtists(n) => {
            let artists = app.top_artists(n.unwrap_or(limit)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&artists)?);
            } else {
                print_artists(&artists);
            }
        }
        Command::Chart => {
            let entries = app.chart().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_entries(&entries);
            }
        }
    }

    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    match dashboard.last_refreshed {
        Some(at) => println!("Chart (refreshed {})", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => println!("Chart is empty, run with --refresh"),
    }
    print_entries(&dashboard.chart);

    println!("\nTop artists");
    print_artists(&dashboard.top_artists);

    println!("\nTop searches");
    print_terms(&dashboard.top_search_terms);
}

fn print_entries(entries: &[ChartEntry]) {
    for entry in entries {
        println!("{:>3}. {} - {}", entry.rank, entry.title, entry.artist);
    }
}

fn print_artists(artists: &[ArtistEntryCount]) {
    for (i, artist) in artists.iter().enumerate() {
        println!("{:>3}. {} ({})", i + 1, artist.artist, artist.entries);
    }
}

fn print_terms(terms: &[SearchTermCount]) {
    for (i, term) in terms.iter().enumerate() {
        println!("{:>3}. {} ({})", i + 1, term.term, term.count);
    }
}
