use clap::Parser;
use fg_places::{util::default_http_client, Client, Coordinate, EndpointConfig, NearbyQueryBuilder};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
    #[arg(short = 'r', long, default_value_t = 1000)]
    radius: u32,
    #[arg(short = 's', long)]
    spatial_endpoint: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let endpoints = EndpointConfig {
        spatial: args.spatial_endpoint,
        ..Default::default()
    };
    let mut client = Client::new(default_http_client(), Some(endpoints)).unwrap();
    let query = NearbyQueryBuilder::default()
        .center(Coordinate::new(args.lat, args.lon).unwrap())
        .radius_m(args.radius)
        .build()
        .unwrap();
    let places = client.find_nearby(&query).await;
    println!("{}", serde_json::to_string(&places).unwrap());
}
