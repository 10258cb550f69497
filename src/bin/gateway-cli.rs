use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the RPC gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3001")]
    url: String,

    #[arg(short, long)]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// Print the route table in match order
    Routes,
    /// List live downstream clients
    Clients,
    /// List cached schema packages
    Schemas,
    /// Drop cached schemas so they are reloaded on next use
    Invalidate {
        /// Only this package
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Drop every downstream client
    ClearClients,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = admin_request(&client, &cli.url, &cli.key, &cli.command)?
        .send()
        .await?;
    print_response(res).await
}

fn admin_request(
    client: &reqwest::Client,
    base_url: &str,
    key: &str,
    command: &Commands,
) -> Result<RequestBuilder, InvalidHeaderValue> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);

    let (method, path) = match command {
        Commands::Status => (Method::GET, "/admin/status"),
        Commands::Routes => (Method::GET, "/admin/routes"),
        Commands::Clients => (Method::GET, "/admin/clients"),
        Commands::Schemas => (Method::GET, "/admin/schemas"),
        Commands::Invalidate { .. } => (Method::POST, "/admin/schemas/invalidate"),
        Commands::ClearClients => (Method::POST, "/admin/clients/clear"),
    };

    let mut request = client
        .request(method, format!("{}{}", base_url.trim_end_matches('/'), path))
        .headers(headers);
    if let Commands::Invalidate { package: Some(package) } = command {
        request = request.query(&[("package", package)]);
    }
    Ok(request)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_is_query_encoded() {
        let command = Commands::Invalidate {
            package: Some("my pkg&admin=1".to_string()),
        };
        let request = admin_request(&reqwest::Client::new(), "http://127.0.0.1:3001/", "k", &command)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.url().path(), "/admin/schemas/invalidate");
        assert_eq!(request.url().query(), Some("package=my+pkg%26admin%3D1"));
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer k");
    }

    #[test]
    fn test_invalidate_all_has_no_query() {
        let command = Commands::Invalidate { package: None };
        let request = admin_request(&reqwest::Client::new(), "http://127.0.0.1:3001", "k", &command)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().query(), None);
    }
}
