use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use cursus_server::{
    app_state::AppState,
    auth::{AuthMiddleware, JwtService},
    config::Config,
    handlers,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        config.validate_for_production();
    }

    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expiration_hours);
    let host = config.web_server_host.clone();
    let port = config.web_server_port;

    let state = AppState::new(config)
        .await
        .unwrap_or_else(|err| panic!("failed to initialize application state: {}", err));

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .service(handlers::health_check)
            .service(handlers::health_check_live)
            .service(handlers::health_check_ready)
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .service(handlers::create_quiz)
                    .service(handlers::get_quiz)
                    .service(handlers::update_quiz)
                    .service(handlers::list_course_quizzes)
                    .service(handlers::create_question)
                    .service(handlers::list_questions)
                    .service(handlers::get_question)
                    .service(handlers::update_question)
                    .service(handlers::delete_question)
                    .service(handlers::start_attempt)
                    .service(handlers::list_attempts)
                    .service(handlers::get_attempt)
                    .service(handlers::submit_attempt)
                    .service(handlers::add_feedback),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
