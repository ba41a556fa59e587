//! Sample UAF server round trip
use uaf::{
    server::{
        testing::SoftAuthenticator, DeregistrationTarget, IssuedRequest, MemoryStore,
        ServerConfig, UafError, UafServer,
    },
    types::{
        metadata::TrustedFacets,
        protocol::{MatchCriteria, Policy, UafRequest, UafResponse, Version},
        Aaid,
    },
};

const APP_ID: &str = "https://uaf.example.com/facets";
const FACET: &str = "https://uaf.example.com";

// The relying party accepts a single authenticator model.
fn policy(aaid: &Aaid) -> Policy {
    Policy {
        accepted: vec![vec![MatchCriteria {
            aaid: Some(vec![aaid.clone()]),
            ..Default::default()
        }]],
        disallowed: None,
    }
}

fn server_setup(authenticator: &SoftAuthenticator) -> UafServer<MemoryStore> {
    let store = MemoryStore::new()
        .with_policy("policy0", policy(authenticator.aaid()))
        .with_metadata(authenticator.metadata())
        .with_trusted_facets(
            APP_ID,
            vec![TrustedFacets {
                version: Version::UAF_1_1,
                ids: vec![FACET.into()],
            }],
        );
    UafServer::new(store, ServerConfig::default()).app_id(APP_ID)
}

// What the relying party would send to the UAF client.
fn print_request(issued: &IssuedRequest) -> Result<(), Box<dyn std::error::Error>> {
    let message = issued.return_message()?;
    println!(
        "{} request:\n\n{}\n\n",
        message.op,
        serde_json::to_string_pretty(&message)?
    );
    Ok(())
}

// What the UAF client would send back.
fn client_message(response: UafResponse) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value([response])
}

fn report(error: &UafError) {
    let status = error.status_code();
    println!("Rejected with {} {}: {error}", status.code(), status.message());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let aaid: Aaid = "ABCD#0001".parse()?;
    let mut authenticator = SoftAuthenticator::new(aaid);
    let server = server_setup(&authenticator);

    // Registration
    let issued = server.start_registration("jdoe", None).await?;
    print_request(&issued)?;
    let UafRequest::Registration(request) = &issued.request else {
        panic!("Our example issues a registration request.");
    };
    let response = authenticator.register(request, FACET)?;
    let registered = server.respond(&client_message(response)?).await?;
    println!("Registered authenticator {}\n\n", registered.authenticator_id);

    // Authentication with a transaction to confirm
    let issued = server
        .start_authentication(Some("jdoe"), Some("Transfer 100 EUR to Jane"), None)
        .await?;
    print_request(&issued)?;
    let UafRequest::Authentication(request) = &issued.request else {
        panic!("Our example issues an authentication request.");
    };
    let response = authenticator.authenticate(request, FACET)?;
    let message = client_message(response)?;
    let authenticated = server.respond(&message).await?;
    println!("Authenticated {}\n\n", authenticated.username);

    // Replaying the same message is refused, its challenge is spent.
    if let Err(error) = server.respond(&message).await {
        report(&error);
    }

    // Deregistration
    let issued = server
        .start_deregistration("jdoe", DeregistrationTarget::All)
        .await?;
    print_request(&issued)?;
    println!(
        "Authenticators left: {}",
        server.store().authenticator_count()
    );

    Ok(())
}
