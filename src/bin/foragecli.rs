use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use fg_places::{
    address, geo, util::default_http_client, Category, Client, Coordinate, EndpointConfig,
    NearbyQueryBuilder,
};
use indicatif::ProgressBar;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct CliArgs {
    #[command(subcommand)]
    pub subcommand: Command,

    #[command(flatten)]
    pub global_opts: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    #[arg(long, global = true, help = "Spatial query endpoint override")]
    pub spatial_endpoint: Option<String>,

    #[arg(long, global = true, help = "Reverse geocoding endpoint override")]
    pub geocode_endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(name = "nearby", about = "Find nearby places and the local address")]
    Nearby {
        #[command(flatten)]
        position: PositionOpts,

        #[arg(short = 'r', long, default_value_t = 1000, help = "Search radius in meters")]
        radius: u32,

        #[arg(
            short = 'c',
            long = "category",
            help = "Category filter (restaurant, cafe, bar, fast_food); repeatable"
        )]
        categories: Vec<String>,

        #[arg(short = 'n', long, default_value_t = 10, help = "Maximum results")]
        cap: usize,

        #[arg(long, help = "Print results as JSON")]
        json: bool,

        #[arg(short = 'o', long, help = "Write results to a JSON file")]
        output_path: Option<String>,
    },

    #[clap(name = "address", about = "Reverse-geocode a coordinate")]
    Address {
        #[command(flatten)]
        position: PositionOpts,
    },

    #[clap(name = "ip-info", about = "Show the public IP and network location")]
    IpInfo,
}

#[derive(Args, Debug)]
struct PositionOpts {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

fn parse_categories(raw: &[String]) -> Result<Vec<Category>> {
    raw.iter()
        .map(|value| match value.as_str() {
            "restaurant" => Ok(Category::Restaurant),
            "cafe" => Ok(Category::Cafe),
            "bar" => Ok(Category::Bar),
            "fast_food" => Ok(Category::FastFood),
            other => bail!("unknown category `{other}`"),
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = CliArgs::parse();
    let http = default_http_client();
    let endpoints = EndpointConfig {
        spatial: args.global_opts.spatial_endpoint,
        geocode: args.global_opts.geocode_endpoint,
        ..Default::default()
    };

    match args.subcommand {
        Command::Nearby {
            position,
            radius,
            categories,
            cap,
            json,
            output_path,
        } => {
            let center = Coordinate::new(position.lat, position.lon)?;
            let mut builder = NearbyQueryBuilder::default();
            builder.center(center).radius_m(radius).result_cap(cap);
            if !categories.is_empty() {
                builder.categories(parse_categories(&categories)?);
            }
            let query = builder.build()?;

            let geocode_endpoint = endpoints.geocode.clone();
            let mut client = Client::new(http.clone(), Some(endpoints))?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_message("searching nearby places...");
            spinner.enable_steady_tick(Duration::from_millis(100));

            // Address and places are independent; overlap their requests.
            let (places, resolved_address) = futures::join!(
                client.find_nearby(&query),
                address::resolve_address(&http, geocode_endpoint.as_deref(), &center),
            );
            spinner.finish_and_clear();

            println!("near: {}", resolved_address);
            if let Some(output_path) = &output_path {
                places.save(output_path).await?;
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&places)?);
            } else if places.is_empty() {
                println!("no places found in this area");
            } else {
                for record in places.iter() {
                    let distance = geo::distance_km(&center, &record.coordinate);
                    let flag = if record.has_complete_address {
                        ""
                    } else {
                        " (address incomplete)"
                    };
                    println!(
                        "{:.1}* {} [{}] - {:.2} km - {}{}",
                        record.rating, record.name, record.cuisine, distance, record.address, flag
                    );
                }
            }
        }
        Command::Address { position } => {
            let center = Coordinate::new(position.lat, position.lon)?;
            let resolved =
                address::resolve_address(&http, endpoints.geocode.as_deref(), &center).await;
            println!("{}", resolved);
        }
        Command::IpInfo => {
            let client = Client::new(http, Some(endpoints))?;
            match client.ip_info().await {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => println!("ip info unavailable"),
            }
        }
    }

    Ok(())
}
