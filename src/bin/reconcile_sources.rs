use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    catalog_reconcile::apps::run_reconcile(std::env::args().skip(1))
}
