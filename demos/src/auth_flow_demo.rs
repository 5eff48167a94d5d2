use dotenv::dotenv;
use std::env;
use talentgate::prelude::*;
use uuid::Uuid;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();
    pretty_env_logger::init();

    let identity_url = env::var("TALENTGATE_IDENTITY_URL").expect("TALENTGATE_IDENTITY_URL must be set");
    let api_url = env::var("TALENTGATE_API_URL").expect("TALENTGATE_API_URL must be set");
    let key = env::var("TALENTGATE_KEY").expect("TALENTGATE_KEY must be set");

    let client = Talentgate::new(&identity_url, &api_url, &key);
    let core = client.core();

    println!("Starting auth flow demo");

    // Generate a unique email so the demo can be re-run
    let unique_id = Uuid::new_v4().to_string();
    let email = format!("demo-candidate-{}@example.com", unique_id);
    let password = "securePassword123!";

    println!("Signing up a new candidate with email: {}", email);

    let next = core.sign_up(&email, password, UserRole::Candidate).await?;
    println!("Sign up complete, next route: {}", next);

    println!("\nSigning in");

    let signed_in = core.sign_in(&email, password).await?;
    println!("Signed in as: {}", signed_in.session.user_id);
    println!("Role: {:?}", signed_in.role);
    println!("Subscription: {:?}", signed_in.subscription);
    println!("Redirect: {}", signed_in.redirect);

    // The snapshot is what guards and views consume
    let snapshot = core.snapshot();
    println!("\nPhase after sign in: {:?}", snapshot.phase());

    println!("\nSigning out");

    let home = core.sign_out().await;
    println!("Signed out, back to: {}", home);
    println!("Phase after sign out: {:?}", core.snapshot().phase());

    println!("Auth flow demo completed");

    Ok(())
}
