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

    println!("Starting usage metering demo");

    let signed_in = core.sign_in(&email, &password).await?;
    println!(
        "Signed in on plan: {:?}",
        signed_in.subscription.as_ref().map(|status| status.tier)
    );

    // Current counters across every metered feature
    println!("\nUsage across all features:");
    let all = core.all_feature_usage().await?;
    for feature in Feature::ALL {
        match all.get(&feature) {
            Some(usage) => println!(
                "  {}: {}/{} ({:?})",
                feature,
                usage.usage_count,
                usage.usage_limit,
                usage.allowance()
            ),
            None => println!("  {}: no counter yet", feature),
        }
    }

    let feature = Feature::AtsScan;
    println!("\nChecking allowance for {}", feature);
    let allowance = core.check_allowance(feature).await?;
    println!("Allowance: {:?}", allowance);

    // Run a fake scan through the metering wrapper; the count only moves
    // when the operation succeeds.
    println!("\nRunning a metered operation");
    match core
        .metered(feature, || async { Ok::<_, Error>("scan-report-42") })
        .await
    {
        Ok((report, recorded)) => {
            println!("Operation result: {}", report);
            println!(
                "Recorded use #{} (reliable: {})",
                recorded.count, recorded.reliable
            );
        }
        Err(Error::LimitReached { feature, message }) => {
            println!("Blocked: {} is out of quota ({})", feature, message);
        }
        Err(err) => return Err(err.into()),
    }

    core.sign_out().await;
    println!("Usage metering demo completed");

    Ok(())
}
