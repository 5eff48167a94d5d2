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

    println!("Starting guard walkthrough");

    // Before sign-in every protected route bounces to the login page
    let snapshot = core.restore_session().await;
    println!("Phase before sign in: {:?}", snapshot.phase());
    for guard in [
        Guard::Authenticated,
        Guard::CandidateOnly,
        Guard::RecruiterOnly,
        Guard::FreePlanOnly,
    ] {
        let outcome = guard.evaluate(&snapshot, Route::CandidateDashboard.as_path());
        println!("  {:?} -> {:?}", guard, outcome);
    }

    println!("\nSigning in as {}", email);
    let signed_in = core.sign_in(&email, &password).await?;
    println!("Landing route: {}", signed_in.redirect);

    let snapshot = core.snapshot();
    println!("Phase after sign in: {:?}", snapshot.phase());
    println!(
        "Plan: {:?}",
        snapshot.subscription.as_ref().map(|status| status.tier)
    );

    // The same guards again, now decided by role and plan
    for guard in [
        Guard::Authenticated,
        Guard::CandidateOnly,
        Guard::RecruiterOnly,
        Guard::FreePlanOnly,
    ] {
        let outcome = guard.evaluate(&snapshot, Route::CandidateDashboard.as_path());
        println!("  {:?} at {} -> {:?}", guard, Route::CandidateDashboard, outcome);
    }

    core.sign_out().await;
    println!("Guard walkthrough completed");

    Ok(())
}
