use std::io;

use actix_web::middleware::Logger;
use actix_web::{web::Data, App, HttpServer};
use tracing::info;

use account_store::{account_requests, AccountStore, Config};

#[actix_rt::main]
async fn main() -> io::Result<()> {
    account_store::init_logging();

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let store = AccountStore::open(&config).map_err(io::Error::other)?;
    let store = Data::new(store);

    info!(address = %config.bind_address, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(store.clone())
            .configure(account_requests::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await
}
