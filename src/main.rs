use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use dotenvy::dotenv;

use marketplace_client::application::auth_service::AuthService;
use marketplace_client::application::cart_service::CartSync;
use marketplace_client::application::catalog_service::{CatalogService, DEFAULT_PAGE_SIZE};
use marketplace_client::application::order_service::OrderService;
use marketplace_client::application::payment_flow::PaymentFlow;
use marketplace_client::domain::catalog::{CatalogFilter, Product, ProductDraft, SortKey};
use marketplace_client::domain::money;
use marketplace_client::domain::order::{DeliveryAddress, Order, OrderStatus};
use marketplace_client::domain::payment::{PaymentMethod, PaymentSelector};
use marketplace_client::domain::session::{Registration, Role, Session, UserProfile};
use marketplace_client::infrastructure::ApiClient;
use marketplace_client::{AppError, ClientConfig, Marketplace, OpenCart, SessionCart};

/// Terminal client for the marketplace
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with an identity-provider token
    Login {
        #[arg(long, env = "MARKETPLACE_ID_TOKEN")]
        token: String,
    },
    /// Forget the stored token
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::Client)]
        role: RoleArg,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show the signed-in profile
    Whoami,
    /// Show the dashboard for the signed-in role
    Dashboard,
    /// Browse products
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        command: CartCommand,
    },
    /// Order the cart and pay for it
    Checkout {
        #[arg(long)]
        phone: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        neighborhood: String,
        #[arg(long)]
        street: Option<String>,
        #[arg(long)]
        commune: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
        /// MPESA, ORANGE_MONEY, AIRTEL_MONEY, AFRI_MONEY, CARTE_BANCAIRE or CASH_ON_DELIVERY
        #[arg(long)]
        method: String,
        /// Mobile money number, defaults to the delivery phone
        #[arg(long)]
        payment_phone: Option<String>,
    },
    /// List or manage orders
    Orders {
        #[command(subcommand)]
        command: Option<OrdersCommand>,
    },
    /// Inspect or abandon a payment
    Payment {
        #[command(subcommand)]
        command: PaymentCommand,
    },
    /// Manage accounts (admin)
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    List {
        #[arg(long, default_value_t = 0)]
        page: i64,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: i64,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Search {
        keyword: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    Show {
        id: String,
    },
    Category {
        name: String,
    },
    Vendor {
        id: String,
    },
    /// List a new product under your account
    Create {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Replace the details of one of your products
    Update {
        id: String,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Set the stock of one of your products
    Stock {
        id: String,
        quantity: i32,
    },
    /// Delete one of your products
    Delete {
        id: String,
    },
}

#[derive(clap::Args, Debug)]
struct ProductArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    price: String,
    #[arg(long, default_value_t = 0)]
    stock: i32,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    image: Option<String>,
    /// Defaults to MARKETPLACE_CURRENCY
    #[arg(long)]
    currency: Option<String>,
}

impl ProductArgs {
    fn into_draft(
        self,
        session: &Session,
        default_currency: &str,
    ) -> Result<ProductDraft, AppError> {
        let price = money::parse_amount(&self.price)
            .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not a price", self.price)))?;
        Ok(ProductDraft {
            vendor_id: session.user_id().to_string(),
            title: self.title,
            description: self.description,
            price,
            category: self.category,
            brand: self.brand,
            currency: self
                .currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| default_currency.to_string()),
            image: self.image,
            stock: self.stock,
        })
    }
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    /// Hide out-of-stock and disabled products
    #[arg(long)]
    available: bool,
    #[arg(long, value_enum, default_value_t = SortArg::Relevance)]
    sort: SortArg,
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    Show,
    Add {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    Set {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    Remove {
        product_id: String,
    },
    Clear,
}

#[derive(Subcommand, Debug)]
enum OrdersCommand {
    Show { id: String },
    Cancel { id: String },
    /// Every order on the marketplace (vendor, admin)
    All,
    Status {
        id: String,
        #[arg(value_enum)]
        status: StatusArg,
    },
    Stats,
}

#[derive(Subcommand, Debug)]
enum PaymentCommand {
    Show {
        id: String,
    },
    Abandon {
        id: String,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List {
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },
    Show {
        id: String,
    },
    SetRole {
        id: String,
        #[arg(value_enum)]
        role: RoleArg,
    },
    Delete {
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RoleArg {
    Client,
    Vendor,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Client => Role::Client,
            RoleArg::Vendor => Role::Vendor,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl From<StatusArg> for OrderStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => OrderStatus::EnAttente,
            StatusArg::Processing => OrderStatus::EnCours,
            StatusArg::Shipped => OrderStatus::EnRoute,
            StatusArg::Delivered => OrderStatus::Livre,
            StatusArg::Cancelled => OrderStatus::Annule,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Relevance,
    PriceAsc,
    PriceDesc,
    Title,
    Newest,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Relevance => SortKey::Relevance,
            SortArg::PriceAsc => SortKey::PriceAsc,
            SortArg::PriceDesc => SortKey::PriceDesc,
            SortArg::Title => SortKey::Title,
            SortArg::Newest => SortKey::Newest,
        }
    }
}

impl FilterArgs {
    fn into_filter(self) -> Result<CatalogFilter, AppError> {
        let max_price = match self.max_price {
            Some(raw) => Some(money::parse_amount(&raw).ok_or_else(|| {
                AppError::InvalidInput(format!("'{}' is not a price", raw))
            })?),
            None => None,
        };
        Ok(CatalogFilter {
            keyword: None,
            category: self.category,
            max_price,
            purchasable_only: self.available,
            sort: self.sort.into(),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let market = Marketplace::connect(ClientConfig::from_env()?)?;
    let auth = AuthService::new(market.api.clone(), Arc::new(market.store.clone()));

    match cli.command {
        Command::Login { token } => {
            let session = auth.sign_in(&token).await?;
            print_profile(&session);
            Ok(())
        }
        Command::Logout => {
            auth.sign_out()?;
            println!("Signed out");
            Ok(())
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            role,
            phone,
        } => {
            if matches!(role, RoleArg::Admin) {
                return Err(AppError::InvalidInput(
                    "administrator accounts cannot be self-registered".to_string(),
                ));
            }
            let registration = Registration {
                last_name,
                first_name,
                email,
                password,
                role: role.into(),
                phone,
                address: None,
            };
            match auth.register(&registration, &confirm_password).await? {
                Some(session) => print_profile(&session),
                None => println!("Account created, sign in to continue"),
            }
            Ok(())
        }
        Command::Users { command } => {
            let session = auth.restore().await?.ok_or(AppError::Unauthorized)?;
            match command {
                UsersCommand::List { role } => {
                    for user in auth.users(&session, role.map(Role::from)).await? {
                        print_user(&user);
                    }
                }
                UsersCommand::Show { id } => print_user(&auth.user(&session, &id).await?),
                UsersCommand::SetRole { id, role } => {
                    print_user(&auth.change_role(&session, &id, role.into()).await?)
                }
                UsersCommand::Delete { id } => {
                    auth.delete_user(&session, &id).await?;
                    println!("User {} deleted", id);
                }
            }
            Ok(())
        }
        command => {
            let session = auth.restore().await?.ok_or(AppError::Unauthorized)?;
            run_signed_in(command, &market, &session).await
        }
    }
}

async fn run_signed_in(
    command: Command,
    market: &Marketplace,
    session: &Session,
) -> Result<(), AppError> {
    let catalog = CatalogService::new(market.api.clone());

    match command {
        Command::Whoami => print_profile(session),
        Command::Dashboard => {
            let dashboard = session.dashboard();
            println!("{}", dashboard.title());
            for card in dashboard.cards() {
                println!("  {} {:<18} {}", card.icon, card.title, card.caption);
            }
        }
        Command::Catalog { command } => match command {
            CatalogCommand::List { page, size, filter } => {
                let listing = catalog.browse(page, size, &filter.into_filter()?).await?;
                print_products(&listing.items);
                println!("page {} ({} products in total)", listing.page, listing.total);
            }
            CatalogCommand::Search { keyword, filter } => {
                let found = catalog
                    .search(&keyword, &filter.into_filter()?)
                    .await?;
                print_products(&found);
            }
            CatalogCommand::Show { id } => {
                let product = catalog.product(&id).await?;
                print_products(std::slice::from_ref(&product));
                if let Some(description) = &product.description {
                    println!("\n{}", description);
                }
            }
            CatalogCommand::Category { name } => {
                print_products(&catalog.by_category(&name).await?)
            }
            CatalogCommand::Vendor { id } => print_products(&catalog.by_vendor(&id).await?),
            CatalogCommand::Create { product } => {
                let draft = product.into_draft(session, &market.config.currency)?;
                let created = catalog.create(session, &draft).await?;
                print_products(std::slice::from_ref(&created));
            }
            CatalogCommand::Update { id, product } => {
                let draft = product.into_draft(session, &market.config.currency)?;
                let updated = catalog.update(session, &id, &draft).await?;
                print_products(std::slice::from_ref(&updated));
            }
            CatalogCommand::Stock { id, quantity } => {
                let product = catalog.set_stock(session, &id, quantity).await?;
                print_products(std::slice::from_ref(&product));
            }
            CatalogCommand::Delete { id } => {
                catalog.delete(session, &id).await?;
                println!("Product {} deleted", id);
            }
        },
        Command::Cart { command } => {
            let OpenCart {
                mut carts, sync, ..
            } = market.open_cart(session).await;
            report_sync(sync);
            match command {
                CartCommand::Show => {}
                CartCommand::Add {
                    product_id,
                    quantity,
                } => {
                    let product = catalog.product(&product_id).await?;
                    report_sync(carts.add(&product, quantity).await?);
                }
                CartCommand::Set {
                    product_id,
                    quantity,
                } => report_sync(carts.set_quantity(&product_id, quantity).await),
                CartCommand::Remove { product_id } => report_sync(carts.remove(&product_id).await),
                CartCommand::Clear => report_sync(carts.clear().await),
            }
            let known = product_details(&catalog, &carts).await;
            print_cart(&carts, &known);
        }
        Command::Checkout {
            phone,
            city,
            neighborhood,
            street,
            commune,
            recipient,
            method,
            payment_phone,
        } => {
            let method = PaymentMethod::from_code(&method).ok_or_else(|| {
                AppError::InvalidInput(format!("unknown payment method '{}'", method))
            })?;
            let address = DeliveryAddress {
                city,
                neighborhood,
                phone: phone.clone(),
                street,
                commune,
                recipient_name: recipient,
                ..Default::default()
            };
            let OpenCart {
                mut carts,
                sync,
                products: known,
            } = market.open_checkout(session, &address).await?;
            report_sync(sync);
            let orders = OrderService::new(market.api.clone(), market.config.currency.clone());
            let handoff = orders.checkout(session, address, carts.cart(), &known).await?;
            println!(
                "Order {} created, {} {} to pay",
                handoff.order_id(),
                money::format_amount(&handoff.amount),
                handoff.currency
            );

            let mut selector = PaymentSelector::new();
            selector.choose(method)?;
            if method.is_mobile_money() {
                selector.set_phone_number(payment_phone.as_deref().unwrap_or(&phone))?;
            }
            println!("{} {}: processing...", method.info().icon, method.info().label);
            let result = PaymentFlow::new(market.api.clone())
                .run(
                    &mut selector,
                    &handoff.payment_context(session),
                    |record| log::debug!("Payment {} confirmed", record.id),
                    |e| log::debug!("Payment error: {:?}", e),
                )
                .await?;

            println!("{}", result.message());
            if let Some(reference) = result.transaction_reference() {
                println!("Reference: {}", reference);
            }
            if result.succeeded() {
                carts.clear().await;
            }
        }
        Command::Orders { command } => {
            let orders = OrderService::new(market.api.clone(), market.config.currency.clone());
            match command {
                None => {
                    for order in orders.my_orders(session).await? {
                        print_order_line(&order);
                    }
                }
                Some(OrdersCommand::Show { id }) => {
                    let order = orders.get_order(&id).await?;
                    print_order_line(&order);
                    for item in &order.items {
                        println!(
                            "    {} x {} @ {}",
                            item.quantity,
                            item.title,
                            money::format_amount(&item.unit_price)
                        );
                    }
                    let payments = PaymentFlow::new(market.api.clone())
                        .order_payments(&order.id)
                        .await?;
                    println!("  paid: {}", if payments.paid { "yes" } else { "no" });
                    for record in &payments.records {
                        print_payment(record);
                    }
                }
                Some(OrdersCommand::Cancel { id }) => {
                    let order = orders.cancel(&id).await?;
                    print_order_line(&order);
                }
                Some(OrdersCommand::All) => {
                    for order in orders.all_orders(session).await? {
                        print_order_line(&order);
                    }
                }
                Some(OrdersCommand::Status { id, status }) => {
                    let order = orders.update_status(session, &id, status.into()).await?;
                    print_order_line(&order);
                }
                Some(OrdersCommand::Stats) => {
                    let stats = orders.stats(session).await?;
                    println!(
                        "{} orders: {} pending, {} processing, {} shipped, {} delivered, {} cancelled",
                        stats.total_orders,
                        stats.en_attente,
                        stats.en_cours,
                        stats.en_route,
                        stats.livre,
                        stats.annule
                    );
                    if let Some(revenue) = &stats.revenue {
                        println!("revenue {}", money::format_amount(revenue));
                    }
                }
            }
        }
        Command::Payment { command } => {
            let flow = PaymentFlow::new(market.api.clone());
            match command {
                PaymentCommand::Show { id } => print_payment(&flow.payment(&id).await?),
                PaymentCommand::Abandon { id, reason } => {
                    print_payment(&flow.abandon(&id, &reason).await?)
                }
            }
        }
        Command::Login { .. }
        | Command::Logout
        | Command::Register { .. }
        | Command::Users { .. } => {}
    }
    Ok(())
}

/// Catalog entries for cart lines that carry no display fields of their own.
async fn product_details(
    catalog: &CatalogService<ApiClient>,
    carts: &SessionCart,
) -> HashMap<String, Product> {
    let mut known = HashMap::new();
    let missing = carts.missing_product_ids(&known);
    catalog.load_missing(&mut known, &missing).await;
    known
}

fn report_sync(sync: CartSync) {
    if sync == CartSync::Local {
        println!("(offline: change kept on this device)");
    }
}

fn print_profile(session: &Session) {
    let profile = session.profile();
    println!(
        "{} <{}> [{}] id {}",
        profile.display_name(),
        profile.email,
        session.role().code(),
        profile.id
    );
}

fn print_products(products: &[Product]) {
    for p in products {
        println!(
            "{:<26} {:<32} {:>10} {} stock {}",
            p.id,
            p.title,
            money::format_amount(&p.price),
            p.currency,
            p.stock
        );
    }
}

fn print_cart(
    carts: &SessionCart,
    known: &HashMap<String, Product>,
) {
    let views = carts.views(known);
    if views.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for line in &views {
        println!(
            "{:<32} {:>3} x {:>10} = {:>10} {}",
            line.title,
            line.quantity,
            money::format_amount(&line.unit_price),
            money::format_amount(&line.line_total),
            line.currency
        );
    }
    println!(
        "{} item(s), total {}",
        carts.total_item_count(),
        money::format_amount(&carts.total(known))
    );
}

fn print_user(user: &UserProfile) {
    println!("{:<28} {:<24} {:<8} {}", user.id, user.display_name(), user.role.code(), user.email);
}

fn print_payment(record: &marketplace_client::domain::payment::PaymentRecord) {
    println!(
        "  {} {} {} {} {:?} {}",
        record.id,
        record.method.code(),
        money::format_amount(&record.amount),
        record.currency.as_deref().unwrap_or(""),
        record.status,
        record.transaction_reference.as_deref().unwrap_or("-")
    );
}

fn print_order_line(order: &Order) {
    println!(
        "{} {:?} {:?} {} {}",
        order.id,
        order.order_status,
        order.payment_status,
        order
            .total_amount
            .as_ref()
            .map(money::format_amount)
            .unwrap_or_else(|| "-".to_string()),
        order.currency.as_deref().unwrap_or("")
    );
}
