//! Pocket Cart CLI - drives the shopping engine against a local SQLite store.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use pocket_cart::config::Config;
use pocket_cart::domain::checkout::{CheckoutForm, PaymentMethod};
use pocket_cart::{ProductDraft, ProductId, PurchaseId, Session, SqliteStore, Storage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pocket-cart", version, about = "Shopping list, cart and checkout")]
struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the shopping list
    List {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Manage the purchase history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Put catalog products in a cart and record the purchase (repeat an id to buy more)
    Buy {
        #[arg(required = true)]
        ids: Vec<i64>,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Check out the shopping list
    Checkout {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: String,
        /// credit, debit or pix
        #[arg(long, default_value = "credit")]
        method: PaymentMethod,
        #[arg(long, default_value = "")]
        card_number: String,
        #[arg(long, default_value = "")]
        expiry: String,
        #[arg(long, default_value = "")]
        cvv: String,
        #[command(flatten)]
        discounts: DiscountArgs,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Categories,
    Add {
        name: String,
        price: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Delete { id: i64 },
    /// Store the sample catalog if none exists
    Seed,
}

#[derive(Subcommand)]
enum ListAction {
    Show {
        #[command(flatten)]
        discounts: DiscountArgs,
    },
    Add {
        id: i64,
        /// Defaults to the catalog price
        #[arg(long)]
        price: Option<String>,
        #[arg(long, default_value = "1")]
        quantity: String,
    },
    Remove { id: i64 },
    Clear,
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Remove { id: String },
    Clear,
}

#[derive(clap::Args)]
struct DiscountArgs {
    /// Fixed amount off the subtotal
    #[arg(long)]
    fixed: Option<String>,
    /// Percentage off the subtotal
    #[arg(long)]
    percent: Option<String>,
    #[arg(long)]
    coupon: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let database_url = cli.database_url.unwrap_or(config.database_url);
    let store = SqliteStore::connect(&database_url).await?;
    let mut session = Session::new(Storage::new(store));
    if config.seed_catalog {
        session.catalog().seed_defaults().await;
    }

    match cli.command {
        Commands::Products { action } => products(&session, action).await,
        Commands::List { action } => list(&mut session, action).await,
        Commands::History { action } => history(&session, action).await,
        Commands::Buy { ids, title } => buy(&mut session, &ids, &title).await,
        Commands::Checkout { name, address, method, card_number, expiry, cvv, discounts } => {
            let form = CheckoutForm::card(name, address, method, card_number, expiry, cvv);
            checkout(&mut session, &form, &discounts).await
        }
    }
}

async fn products(session: &Session, action: ProductsAction) -> Result<()> {
    let catalog = session.catalog();
    match action {
        ProductsAction::List { category } => {
            let category = category.unwrap_or_else(|| "all".into());
            for p in catalog.products_in_category(&category).await {
                println!("{:>14}  {:<20} {:<12} {}", p.id, p.name, p.category, p.price);
            }
        }
        ProductsAction::Categories => {
            for category in catalog.categories().await { println!("{category}"); }
        }
        ProductsAction::Add { name, price, category, description } => {
            let product = catalog.add_product(ProductDraft::new(name, price).category(category).description(description)).await?;
            println!("added {} ({})", product.name, product.id);
        }
        ProductsAction::Delete { id } => {
            if !catalog.delete_product(ProductId::new(id)).await { bail!("product {id} not found"); }
        }
        ProductsAction::Seed => {
            if !catalog.seed_defaults().await { println!("catalog already present"); }
        }
    }
    Ok(())
}

async fn list(session: &mut Session, action: ListAction) -> Result<()> {
    match action {
        ListAction::Show { discounts } => {
            session.refresh_shopping_list().await;
            apply_discounts(session, &discounts)?;
            print_shopping_list(session);
        }
        ListAction::Add { id, price, quantity } => {
            let Some(product) = session.catalog().find_product(ProductId::new(id)).await else {
                bail!("product {id} not found");
            };
            let price = price.unwrap_or_else(|| product.price.amount().to_string());
            let items = session.shopping_list().upsert(&product, &price, &quantity).await?;
            println!("{} on the list ({} lines)", product.name, items.len());
        }
        ListAction::Remove { id } => {
            if !session.shopping_list().remove(ProductId::new(id)).await { bail!("could not update the shopping list"); }
        }
        ListAction::Clear => {
            if !session.shopping_list().clear().await { bail!("could not clear the shopping list"); }
        }
    }
    Ok(())
}

async fn history(session: &Session, action: HistoryAction) -> Result<()> {
    let history = session.history();
    match action {
        HistoryAction::List => {
            for entry in history.get_history().await {
                println!("{}  {}  {}  {}", entry.id, entry.date.format("%d/%m/%Y %H:%M"), entry.title, entry.total);
                for item in &entry.items {
                    println!("    {} x {:<20} {}", item.quantity, item.name, item.line_total());
                }
            }
        }
        HistoryAction::Remove { id } => {
            if !history.remove_entry(&PurchaseId::new(id)).await { bail!("could not update the purchase history"); }
        }
        HistoryAction::Clear => {
            if !history.clear_all().await { bail!("could not clear the purchase history"); }
        }
    }
    Ok(())
}

async fn buy(session: &mut Session, ids: &[i64], title: &str) -> Result<()> {
    for &id in ids {
        if !session.add_to_cart(ProductId::new(id)).await { bail!("product {id} not found"); }
    }
    let total = session.cart().total();
    if !session.finalize_purchase(title).await { bail!("could not record the purchase"); }
    println!("purchase recorded: {total}");
    Ok(())
}

async fn checkout(session: &mut Session, form: &CheckoutForm, discounts: &DiscountArgs) -> Result<()> {
    session.refresh_shopping_list().await;
    if session.shopping_list_items().is_empty() { bail!("the shopping list is empty"); }
    apply_discounts(session, discounts)?;
    print_shopping_list(session);

    let mut flow = session.begin_checkout();
    let receipt = session.checkout(&mut flow, form).await?;
    match receipt.card_last4 {
        Some(last4) => println!("paid {} by {} card ending {last4}", receipt.total, receipt.payment_method),
        None => println!("paid {} by {}", receipt.total, receipt.payment_method),
    }
    println!("thank you, {}!", receipt.customer);
    Ok(())
}

fn apply_discounts(session: &mut Session, args: &DiscountArgs) -> Result<()> {
    if let Some(fixed) = &args.fixed { session.set_fixed_discount(fixed)?; }
    if let Some(percent) = &args.percent { session.set_percent_discount(percent)?; }
    if let Some(code) = &args.coupon { session.apply_coupon(code)?; }
    Ok(())
}

fn print_shopping_list(session: &Session) {
    for item in session.shopping_list_items() {
        println!("{:>14}  {} x {:<20} {}", item.id, item.quantity, item.name, item.line_total());
    }
    let b = session.discount_breakdown();
    println!("subtotal  {}", b.subtotal);
    println!("discount  {}", b.total_discount);
    if let Some(coupon) = session.discounts().coupon() { println!("coupon    {}", coupon.code); }
    println!("total     {}", b.final_total);
}
