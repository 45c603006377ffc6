use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tradepilot::blog::{self, BlogFilter, ALL_POSTS};
use tradepilot::board::DragTarget;
use tradepilot::forms::LeadForm;
use tradepilot::leads::LeadCard;
use tradepilot::models::{Availability, JobStatus, Priority, RowId};
use tradepilot::notify::Toast;
use tradepilot::pages::LoginPage;
use tradepilot::routes::LoginType;
use tradepilot::TradePilot;

#[derive(Parser, Debug)]
#[clap(name = "tradepilot", version)]
#[clap(about = "Trade Pilot marketplace from the command line", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Account email. Falls back to TRADEPILOT_EMAIL.
    #[clap(long, global = true)]
    email: Option<String>,

    /// Account password. Falls back to TRADEPILOT_PASSWORD.
    #[clap(long, global = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and show where the account lands
    Login {
        /// Use the trade login page
        #[clap(long)]
        trade: bool,
    },
    /// List leads with their bids
    Leads,
    /// Post a new lead
    AddLead {
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        service: String,
        #[clap(long)]
        location: String,
        #[clap(long)]
        value: String,
        #[clap(long)]
        phone: Option<String>,
        #[clap(long, default_value = "low")]
        priority: Priority,
    },
    /// Quote for a lead as the signed-in trade
    Quote {
        #[clap(long)]
        lead: RowId,
        #[clap(long)]
        value: String,
        /// today, tomorrow or week
        #[clap(long, default_value = "today")]
        available: Availability,
    },
    /// Accept a proposal on one of your leads
    Accept {
        #[clap(long)]
        lead: RowId,
        #[clap(long)]
        bid: RowId,
    },
    /// Show the job board
    Jobs,
    /// Move a job to another column (todo, in-progress, complete)
    MoveJob {
        #[clap(long)]
        job: RowId,
        #[clap(long)]
        to: JobStatus,
    },
    /// Browse the blog
    Blog {
        #[clap(long, default_value = ALL_POSTS)]
        category: String,
        #[clap(long, default_value = "")]
        search: String,
        /// Show a single post
        #[clap(long)]
        post: Option<String>,
    },
}

fn print_toasts(toasts: Vec<Toast>) {
    for toast in toasts {
        let marker = if toast.is_error() { "!" } else { "*" };
        match toast.description {
            Some(description) => eprintln!("{} {}: {}", marker, toast.title, description),
            None => eprintln!("{} {}", marker, toast.title),
        }
    }
}

async fn sign_in(app: &TradePilot, cli: &Cli, login_type: LoginType) -> anyhow::Result<()> {
    let email = cli
        .email
        .clone()
        .or_else(|| std::env::var("TRADEPILOT_EMAIL").ok())
        .context("--email or TRADEPILOT_EMAIL is required for this command")?;
    let password = cli
        .password
        .clone()
        .or_else(|| std::env::var("TRADEPILOT_PASSWORD").ok())
        .context("--password or TRADEPILOT_PASSWORD is required for this command")?;

    let mut page = LoginPage::new(login_type);
    page.email = email;
    page.password = password;
    let redirect = page.submit(&app.session).await;
    print_toasts(app.notifier.drain());
    if let Some(route) = redirect? {
        println!("Signed in, continue at {}", route);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = TradePilot::from_env().context("Failed to configure the client")?;
    app.session.initialize().await;

    match &cli.command {
        Commands::Login { trade } => {
            let login_type = if *trade { LoginType::Trade } else { LoginType::Customer };
            let page = LoginPage::new(login_type);
            println!("{} - {}", page.title(), page.subtitle());
            sign_in(&app, &cli, login_type).await?;
        }
        Commands::Leads => {
            sign_in(&app, &cli, LoginType::Trade).await?;
            let profile = app.session.profile().await;
            let mut screen = app.trade_leads();
            screen.refresh().await?;
            for lead in screen.leads() {
                let action = profile
                    .as_ref()
                    .map(|p| LeadCard::new(lead, p).quote_label())
                    .unwrap_or("Quote");
                println!(
                    "#{} {} - {} in {} (£{}) [{}] {}",
                    lead.id,
                    lead.name,
                    lead.service.as_deref().unwrap_or("-"),
                    lead.location.as_deref().unwrap_or("-"),
                    lead.value.unwrap_or_default(),
                    lead.priority,
                    action
                );
                for bid in &lead.bids {
                    let bidder = bid
                        .bidder
                        .as_ref()
                        .map(|p| p.full_name())
                        .unwrap_or_default();
                    println!(
                        "    bid #{} £{} {} {} {}",
                        bid.id,
                        bid.proposed_value.unwrap_or_default(),
                        bid.available.describe(),
                        bid.status,
                        bidder
                    );
                }
            }
        }
        Commands::AddLead {
            name,
            service,
            location,
            value,
            phone,
            priority,
        } => {
            sign_in(&app, &cli, LoginType::Customer).await?;
            let mut form = LeadForm::for_profile(app.session.profile().await.as_ref());
            if let Some(name) = name {
                form.name = name.clone();
            }
            if let Some(phone) = phone {
                form.phone = phone.clone();
            }
            if form.email.is_empty() {
                form.email = cli.email.clone().unwrap_or_default();
            }
            form.service = service.clone();
            form.location = location.clone();
            form.value = value.clone();
            form.priority = *priority;
            form.open();
            let result = form.submit(app.api.as_ref(), &app.notifier).await;
            print_toasts(app.notifier.drain());
            result?;
        }
        Commands::Quote {
            lead,
            value,
            available,
        } => {
            sign_in(&app, &cli, LoginType::Trade).await?;
            let profile = app
                .session
                .profile()
                .await
                .context("No profile for the signed-in account")?;
            let mut screen = app.trade_leads();
            screen.refresh().await?;
            let opened = screen.open_quote(*lead, &profile);
            if opened.is_ok() {
                screen.quote.proposed_value = value.clone();
                screen.quote.available = *available;
            }
            let result = match opened {
                Ok(()) => screen.submit_quote(&profile).await,
                Err(err) => Err(err),
            };
            print_toasts(app.notifier.drain());
            result?;
        }
        Commands::Accept { lead, bid } => {
            sign_in(&app, &cli, LoginType::Customer).await?;
            let mut dashboard = app.customer_dashboard();
            dashboard.refresh().await?;
            let result = dashboard.accept(*lead, *bid).await;
            print_toasts(app.notifier.drain());
            let jobs = result?;
            for job in jobs {
                println!("Created job #{} ({})", job.id, job.status);
            }
        }
        Commands::Jobs => {
            sign_in(&app, &cli, LoginType::Trade).await?;
            let mut screen = app.job_board();
            screen.refresh().await?;
            for column in screen.board.columns() {
                println!("{} ({})", column.name(), column.items.len());
                for job in column.visible_items() {
                    println!(
                        "    #{} {} - {} £{} {}",
                        job.id,
                        job.trade.as_deref().unwrap_or("-"),
                        job.location.as_deref().unwrap_or("-"),
                        job.rate.unwrap_or_default(),
                        job.tag_list().join(", ")
                    );
                }
                if column.has_more() {
                    println!("    ... {} more", column.items.len() - column.visible_count());
                }
            }
        }
        Commands::MoveJob { job, to } => {
            sign_in(&app, &cli, LoginType::Trade).await?;
            let mut screen = app.job_board();
            screen.refresh().await?;
            screen.board.drag_start(*job);
            if screen.board.active_job().is_none() {
                anyhow::bail!("Job #{} not found", job);
            }
            let result = screen.drop_card(Some(DragTarget::Column(*to))).await;
            print_toasts(app.notifier.drain());
            if result?.is_none() {
                println!("Job #{} is already in {}", job, to.column_name());
            }
        }
        Commands::Blog {
            category,
            search,
            post,
        } => match post {
            Some(id) => {
                let post = blog::find(id).with_context(|| format!("No blog post {}", id))?;
                println!("{}\n{}\n", post.seo_title(), post.seo_description());
                println!("{} | {} | {}", post.author, post.date, post.read_time);
                for related in blog::related(post) {
                    println!("  related: {}", related.title);
                }
            }
            None => {
                println!("{}\n", blog::BLOG_TITLE);
                let filter = BlogFilter {
                    category: category.clone(),
                    search: search.clone(),
                };
                if let Some(featured) = blog::featured().filter(|p| filter.matches(p)) {
                    println!("* {} ({})", featured.title, featured.category);
                }
                for post in filter.apply() {
                    println!("  {} ({}, {})", post.title, post.category, post.read_time);
                }
            }
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tradepilot=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}
