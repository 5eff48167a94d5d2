use dotenv::dotenv;
use std::env;
use talentgate::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    pretty_env_logger::init();

    let identity_url = env::var("TALENTGATE_IDENTITY_URL").expect("TALENTGATE_IDENTITY_URL must be set");
    let api_url = env::var("TALENTGATE_API_URL").expect("TALENTGATE_API_URL must be set");
    let key = env::var("TALENTGATE_KEY").expect("TALENTGATE_KEY must be set");
    let email = env::var("TALENTGATE_EMAIL").expect("TALENTGATE_EMAIL must be set");
    let password = env::var("TALENTGATE_PASSWORD").expect("TALENTGATE_PASSWORD must be set");

    let client = Talentgate::new(&identity_url, &api_url, &key);
    let core = client.core();

    println!("Starting subscription demo");

    let signed_in = core.sign_in(&email, &password).await?;
    println!("Current subscription: {:?}", signed_in.subscription);

    println!("\nUpgrading to premium");
    let redirect = core.update_subscription(PlanTier::Premium).await?;
    println!("Upgrade applied, next route: {}", redirect);

    let snapshot = core.snapshot();
    println!(
        "Refreshed subscription: {:?}",
        snapshot.subscription.as_ref()
    );

    println!("\nCancelling (access runs until the end date)");
    core.cancel_subscription().await?;
    let snapshot = core.snapshot();
    if let Some(status) = snapshot.subscription.as_ref() {
        println!(
            "After cancel: tier {} active {} cancelled {} until {:?}",
            status.tier, status.active, status.cancelled, status.end_date
        );
    }

    core.sign_out().await;
    println!("Subscription demo completed");

    Ok(())
}
