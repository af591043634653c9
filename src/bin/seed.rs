use std::sync::Arc;

use clap::Parser;
use fake::{
    faker::{internet::en::SafeEmail, name::en::Name, phone_number::en::PhoneNumber},
    Fake,
};
use sqlx::sqlite::SqlitePoolOptions;

use lacquer::{
    config::Settings,
    domain::{
        default_faqs, default_reminders, CreateFaqRequest, CreateReminderRequest,
        CreateUserRequest, UserRole,
    },
    payments::{PaymentGateway, PaymongoClient},
    service::ServiceContext,
};

/// Fill a database with the salon's default settings and some accounts.
#[derive(Debug, Parser)]
#[command(name = "seed")]
struct Args {
    /// Database URL; defaults to the configured one
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long, default_value = "admin@lacquer.local")]
    admin_email: String,

    #[arg(long, default_value = "admin123")]
    admin_password: String,

    /// Number of sample customer accounts
    #[arg(long, default_value_t = 5)]
    customers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = Settings::new().unwrap_or_default();
    let database_url = args.database_url.unwrap_or_else(|| settings.database.url.clone());

    println!("🌱 Seeding {}", database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaymongoClient::new(&settings.paymongo)?);
    let ctx = ServiceContext::new(db_pool, &settings, gateway)?;

    println!("👤 Creating accounts...");
    if ctx.user_repo.find_by_email(&args.admin_email).await?.is_none() {
        ctx.user_repo
            .create(CreateUserRequest {
                email: args.admin_email.clone(),
                full_name: "Salon Admin".to_string(),
                phone: None,
                password: args.admin_password.clone(),
                role: UserRole::Admin,
            })
            .await?;
        println!("  ✅ Admin {} / {}", args.admin_email, args.admin_password);
    } else {
        println!("  ⏭️  Admin {} already exists", args.admin_email);
    }

    let mut customers = 0;
    for _ in 0..args.customers {
        let email: String = SafeEmail().fake();
        if ctx.user_repo.find_by_email(&email).await?.is_some() {
            continue;
        }
        ctx.user_repo
            .create(CreateUserRequest {
                email,
                full_name: Name().fake(),
                phone: Some(PhoneNumber().fake()),
                password: "password123".to_string(),
                role: UserRole::Customer,
            })
            .await?;
        customers += 1;
    }
    println!("  ✅ {} customers (password: password123)", customers);

    println!("💅 Creating appointment types...");
    let types = ctx.appointment_type_service.seed_defaults().await?;
    println!("  ✅ {} new appointment types", types.len());

    println!("🗓️  Creating weekly slots...");
    let slots = ctx.booking_service.seed_default_slots().await?;
    println!("  ✅ {} new slots", slots.len());

    println!("❓ Creating FAQs and reminders...");
    if ctx.faq_repo.list(true).await?.is_empty() {
        for (question, answer) in default_faqs() {
            ctx.faq_repo
                .create(CreateFaqRequest {
                    question: question.to_string(),
                    answer: answer.to_string(),
                })
                .await?;
        }
    }
    if ctx.reminder_repo.list(true).await?.is_empty() {
        for (title, body) in default_reminders() {
            ctx.reminder_repo
                .create(CreateReminderRequest {
                    title: title.to_string(),
                    body: body.to_string(),
                })
                .await?;
        }
    }

    println!("🎉 Seeding complete");
    Ok(())
}
