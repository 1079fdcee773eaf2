use crate::seed::{Seeder, run_seeder};
use crate::seeds::{demo::DemoSeeder, staff::StaffSeeder};

mod seed;
mod seeds;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let db = db::connect().await;

    for (seeder, name) in [
        (Box::new(StaffSeeder) as Box<dyn Seeder + Send + Sync>, "Staff"),
        (Box::new(DemoSeeder), "Demo"),
    ] {
        run_seeder(&*seeder, name, &db).await;
    }
}
