mod api;
mod dao;
mod model;
mod service;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::Duration;

use crate::api::endpoints::{anno_kilometers_list, postcode_add, postcodes_list, premium_calculate, premium_quote, regions_list, vehicles_list};
use crate::api::middleware::timing_middleware;
use crate::api::state::AppState;
use crate::dao::Repositories;
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::config::{ApplicationArguments, Config, DatabaseType, LoggingConfig};
use crate::service::catalog::CatalogService;
use crate::service::rating::RatingService;
use crate::service::statistics::StatisticsService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use sqlx::{Pool, Postgres, pool};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

/**
 * Entry point: reads the configuration, connects to the database and serves the rating API.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging).map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))?;

    let connection_pool = init_connection_pool(&config).await.map_err(|err| std::io::Error::other(err.to_string()))?;

    let repositories = Repositories::postgres(&connection_pool);
    let statistics_service = StatisticsService::new(&repositories);
    let rating_service = RatingService::new(config.rating.basis.get(), &repositories, statistics_service);
    let catalog_service = CatalogService::new(&repositories);

    let state = web::Data::new(AppState::new(rating_service, catalog_service));

    let prometheus = PrometheusMetricsBuilder::new("")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let active_connections_gauge = IntGauge::new("active_connections", "Connection pool active").map_err(|err| std::io::Error::other(format!("Failed to create active_connections gauge: {err}")))?;
    let idle_connections_gauge = IntGauge::new("idle_connections", "Connection pool idle").map_err(|err| std::io::Error::other(format!("Failed to create idle_connections gauge: {err}")))?;
    register_prometheus_metrics(&prometheus, &active_connections_gauge)?;
    register_prometheus_metrics(&prometheus, &idle_connections_gauge)?;

    gather_db_metrics(active_connections_gauge, idle_connections_gauge, connection_pool);

    tracing::info!("Starting insurance premium API on {}:{}", config.server.bind_address, config.server.http_port);

    HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .service(vehicles_list)
            .service(regions_list)
            .service(anno_kilometers_list)
            .service(postcodes_list)
            .service(premium_calculate)
            .service(premium_quote)
            .service(postcode_add)
    })
    .bind((config.server.bind_address.as_str(), config.server.http_port))?
    .workers(config.server.workers)
    .run()
    .await
}

/**
 * Initializes the tracing subscriber from the logging configuration.
 *
 * #Arguments
 * `logging`: The logging configuration.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging: &LoggingConfig) -> Result<(), ApplicationError> {
    let mut env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in &logging.directives {
        env_filter = env_filter.add_directive(directive.parse::<Directive>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Invalid logging directive {directive}: {err}")))?);
    }
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(logging.target)
        .with_thread_ids(logging.thread_ids)
        .with_thread_names(logging.thread_names)
        .with_line_number(logging.line_number)
        .with_level(logging.level)
        .with_file(logging.file);
    let result = match &logging.logfile {
        Some(logfile) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(logfile)
                .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to open log file {logfile}: {err}")))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_ansi(logging.ansi).try_init(),
    };
    result.map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to install tracing subscriber: {err}")))
}

/**
 * Creates the connection pool and applies migrations when configured.
 *
 * #Arguments
 * `config`: The application configuration.
 *
 * #Returns
 * The connection pool or an initialization error.
 */
async fn init_connection_pool(config: &Config) -> Result<Pool<Postgres>, ApplicationError> {
    let connection_pool: Pool<Postgres> = match &config.database.db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime } => pool::PoolOptions::new()
            .max_connections(*max_connections)
            .min_connections(*min_connections)
            .acquire_timeout(Duration::from_millis(*acquire_timeout))
            .acquire_slow_threshold(Duration::from_millis(*acquire_slow_threshold))
            .idle_timeout(Duration::from_millis(*idle_timeout))
            .max_lifetime(Duration::from_millis(*max_lifetime))
            .connect(connection_string.as_str())
            .await
            .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create database pool: {err}")))?,
    };
    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&connection_pool)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to run migrations: {err}")))?;
        tracing::info!("Database migrations applied");
    }
    Ok(connection_pool)
}

/**
 * Registers custom Prometheus metrics.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauge with.
 * `gauge`: The gauge to register.
 */
fn register_prometheus_metrics(prometheus_metrics: &PrometheusMetrics, gauge: &IntGauge) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus gauge: {err}")))?;
    Ok(())
}

/**
 * Updates the connection pool gauges once per second.
 *
 * #Arguments
 * `active_connections_gauge`: Gauge for active connections.
 * `idle_connections_gauge`: Gauge for idle connections.
 * `connection_pool`: The connection pool to gather metrics from.
 */
fn gather_db_metrics(active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, connection_pool: Pool<Postgres>) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            active_connections_gauge.set(i64::from(connection_pool.size()));
            idle_connections_gauge.set(i64::try_from(connection_pool.num_idle()).unwrap_or(i64::MAX));
        }
    });
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
