use bookstore::book::{Book, BookField, BookUpdate};
use bookstore::config::BookstoreConfig;
use bookstore::index::IndexSpec;
use bookstore::query::{Filter, MAX_LIMIT, parse_filter_json};
use bookstore::service::{BookstoreService, ListQuery, SortDirection};
use bookstore::store::MemoryDatabase;
use bookstore::{logger, sample};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "bookstore", version, about = "Query a book catalog held in an in-memory document store", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). Falls back to BOOKSTORE_CONFIG, then ./bookstore.toml.")]
    config: Option<PathBuf>,
    #[arg(long, help = "JSON array of books to load; defaults to the bundled twelve-title catalog")]
    data: Option<PathBuf>,
    #[arg(long, help = "Collection name (takes precedence over config/env)")]
    collection: Option<String>,
    #[arg(long, help = "Skip local shape validation on writes")]
    no_validate: bool,
    #[arg(long, help = "Write app.log/ops.log to this directory")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "Log level: error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, value_delimiter = ',', default_value = "title,author,price", help = "Fields to return; add _id to include the identifier")]
    fields: Vec<String>,
    #[arg(long, default_value = "price", help = "Field to sort by")]
    sort: String,
    #[arg(long, default_value = "ascending", help = "ascending|descending")]
    direction: String,
    #[arg(long, default_value_t = 1, help = "1-indexed page number")]
    page: usize,
    #[arg(long, help = "Rows per page; defaults to default_page_size from config")]
    page_size: Option<usize>,
    #[arg(long, help = "Secondary sort field for ties (ascending)")]
    then_by: Option<String>,
}

impl ListArgs {
    fn to_query(&self) -> Result<ListQuery, Box<dyn std::error::Error>> {
        let fields = self.fields.iter().map(|f| f.parse::<BookField>()).collect::<Result<Vec<_>, _>>()?;
        let mut q = ListQuery::new(fields)
            .sort(self.sort.parse()?, self.direction.parse::<SortDirection>()?)
            .page(self.page);
        if let Some(size) = self.page_size {
            q = q.page_size(size);
        }
        if let Some(f) = &self.then_by {
            q = q.then_by(f.parse()?, SortDirection::Ascending);
        }
        Ok(q)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "find-genre", about = "Books in a genre")]
    FindGenre { genre: String },
    #[command(name = "find-author", about = "Books by an author")]
    FindAuthor { author: String },
    #[command(name = "published-after", about = "Books published after a year")]
    PublishedAfter { year: i32 },
    #[command(name = "find-title", about = "Books with an exact title")]
    FindTitle { title: String },
    #[command(about = "Set fields on the first book with a title")]
    Update {
        title: String,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        in_stock: Option<bool>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        published_year: Option<i32>,
    },
    #[command(about = "Delete the first book with a title")]
    Delete { title: String },
    #[command(about = "In-stock books published after a year, projected and paged")]
    List {
        #[arg(long, default_value_t = 2010)]
        after: i32,
        #[command(flatten)]
        list: ListArgs,
    },
    #[command(about = "The whole catalog, projected and paged")]
    Catalog {
        #[command(flatten)]
        list: ListArgs,
    },
    #[command(name = "genre-prices", about = "Average price and count per genre")]
    GenrePrices,
    #[command(name = "top-author", about = "Author with the most books")]
    TopAuthor,
    #[command(about = "Books per publication decade")]
    Decades,
    #[command(about = "Create an index, e.g. title:1 or author:1,published_year:-1")]
    Index { spec: String },
    #[command(about = "Explain a filter, e.g. {\"field\": \"title\", \"$eq\": \"The Hobbit\"}")]
    Explain { filter: String },
    #[command(about = "List defined indexes")]
    Indexes,
    #[command(about = "Number of books")]
    Count,
    #[command(about = "Run every operation in sequence against the catalog")]
    Tutorial,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_books(data: Option<&PathBuf>) -> Result<Vec<Book>, Box<dyn std::error::Error>> {
    match data {
        Some(p) => Ok(sample::parse_catalog(&std::fs::read_to_string(p)?)?),
        None => Ok(sample::sample_books()?),
    }
}

fn print_books(svc_result: bookstore::errors::Result<bookstore::BookCursor>) -> Result<(), Box<dyn std::error::Error>> {
    let books = svc_result?.collect::<Result<Vec<_>, _>>()?;
    print_json(&books)
}

fn tutorial(svc: &BookstoreService) -> Result<(), Box<dyn std::error::Error>> {
    let step = |title: &str| println!("\n== {title} ==");
    step("books in Fiction");
    print_books(svc.find_by_genre("Fiction"))?;
    step("published after 1950");
    print_books(svc.find_published_after(1950))?;
    step("by Paulo Coelho");
    print_books(svc.find_by_author("Paulo Coelho"))?;
    step("price of Wuthering Heights -> 12.50");
    print_json(&svc.update_field("Wuthering Heights", &BookUpdate::new().price(12.5))?)?;
    step("delete Moby Dick");
    print_json(&svc.delete_one("Moby Dick")?)?;

    let projected = [BookField::Title, BookField::Author, BookField::Price];
    let everything = usize::try_from(svc.count()?)?.clamp(1, MAX_LIMIT);
    step("in stock and published after 2010");
    print_json(&svc.list_in_stock_after(2010, &ListQuery::new(projected))?)?;
    step("catalog by price, ascending");
    print_json(&svc.list_catalog(&ListQuery::new(projected).page_size(everything))?)?;
    step("catalog by price, descending");
    print_json(&svc.list_catalog(&ListQuery::new(projected).sort(BookField::Price, SortDirection::Descending).page_size(everything))?)?;
    for page in 1..=3 {
        step(&format!("page {page} of 5, by price descending"));
        let q = ListQuery::new(projected).sort(BookField::Price, SortDirection::Descending).page(page).page_size(5);
        print_json(&svc.list_catalog(&q)?)?;
    }

    step("average price by genre");
    print_json(&svc.average_price_by_genre()?)?;
    step("author with most books");
    print_json(&svc.author_with_most_books()?)?;
    step("books per decade");
    print_json(&svc.count_by_decade()?)?;

    let hobbit = Filter::eq("title", "The Hobbit");
    step("explain title lookup before index");
    print_json(&svc.explain_performance(&hobbit)?)?;
    svc.ensure_index(&IndexSpec::asc("title"))?;
    step("explain title lookup after index");
    print_json(&svc.explain_performance(&hobbit)?)?;
    let orwell = Filter::and([Filter::eq("author", "George Orwell"), Filter::eq("published_year", 1949)]);
    step("explain author/year lookup before compound index");
    print_json(&svc.explain_performance(&orwell)?)?;
    svc.ensure_index(&"author:1,published_year:-1".parse()?)?;
    step("explain author/year lookup after compound index");
    print_json(&svc.explain_performance(&orwell)?)?;
    step("indexes");
    print_json(&svc.list_indexes()?)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Precedence: CLI > env > config file > defaults
    let mut cfg = BookstoreConfig::load(cli.config.as_deref())?;
    if let Some(c) = cli.collection {
        cfg.collection = c;
    }
    if cli.no_validate {
        cfg.validate_on_write = false;
    }
    if cli.log_dir.is_some() {
        cfg.logging.dir = cli.log_dir;
    }
    if cli.log_level.is_some() {
        cfg.logging.level = cli.log_level;
    }
    if cfg.logging.dir.is_some() {
        logger::configure_from_config(&cfg.logging)?;
    }

    let db = MemoryDatabase::new();
    let collection = db.create_collection(&cfg.collection)?;
    let svc = BookstoreService::new(Arc::new(collection), cfg.service());
    svc.insert_many(load_books(cli.data.as_ref())?)?;

    match cli.command {
        Commands::FindGenre { genre } => print_books(svc.find_by_genre(&genre)),
        Commands::FindAuthor { author } => print_books(svc.find_by_author(&author)),
        Commands::PublishedAfter { year } => print_books(svc.find_published_after(year)),
        Commands::FindTitle { title } => print_books(svc.find_by_title(&title)),
        Commands::Update { title, price, in_stock, genre, author, published_year } => {
            let upd = BookUpdate { title: None, author, genre, published_year, price, in_stock };
            print_json(&svc.update_field(&title, &upd)?)
        }
        Commands::Delete { title } => print_json(&svc.delete_one(&title)?),
        Commands::List { after, list } => print_json(&svc.list_in_stock_after(after, &list.to_query()?)?),
        Commands::Catalog { list } => print_json(&svc.list_catalog(&list.to_query()?)?),
        Commands::GenrePrices => print_json(&svc.average_price_by_genre()?),
        Commands::TopAuthor => print_json(&svc.author_with_most_books()?),
        Commands::Decades => print_json(&svc.count_by_decade()?),
        Commands::Index { spec } => print_json(&svc.ensure_index(&spec.parse()?)?),
        Commands::Explain { filter } => print_json(&svc.explain_performance(&parse_filter_json(&filter)?)?),
        Commands::Indexes => print_json(&svc.list_indexes()?),
        Commands::Count => print_json(&svc.count()?),
        Commands::Tutorial => tutorial(&svc),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
