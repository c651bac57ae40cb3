// src/main.rs

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use energia_backend::{
    app::build_router,
    config::{AppConfig, AppState},
    db::user_repo::NewUser,
    services::{auth::hash_password, NucleoClient},
};

/// Backend de energia e orçamento
#[derive(Parser)]
#[command(name = "energia-backend", version, about = "API de consumo de energia e orçamento das dependências")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Sobe o servidor HTTP (padrão)
    Serve,
    /// Sincroniza setores, dependências e titulares com o Núcleo Digital
    SyncGobierno,
    /// Cria um usuário com o cargo Super Admin na dependência global
    CreateAdmin(CreateAdminArgs),
    /// Confere o catálogo de permissões do banco e sai
    CheckCatalog,
}

#[derive(Args)]
struct CreateAdminArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "ADMIN_PASSWORD")]
    password: String,
    #[arg(long, default_value = "Administrador")]
    first_name: String,
    #[arg(long, default_value = "Sistema")]
    last_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;
    let pool = config.connect().await?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::new(config, pool);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(app_state).await,
        Command::SyncGobierno => sync_gobierno(app_state).await,
        Command::CreateAdmin(args) => create_admin(app_state, args).await,
        Command::CheckCatalog => {
            app_state.authz.verify_catalog().await?;
            tracing::info!("Catálogo de permissões conferido");
            Ok(())
        }
    }
}

async fn serve(app_state: AppState) -> Result<()> {
    // Sem o catálogo completo o servidor não sobe
    app_state.authz.verify_catalog().await?;

    let addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {addr}"))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

async fn sync_gobierno(app_state: AppState) -> Result<()> {
    let client = NucleoClient::new(app_state.config.nucleo.clone())?;
    let data = client.fetch().await?;
    tracing::info!(
        sectors = data.sectors.len(),
        agencies = data.agencies.len(),
        "Dados recebidos do Núcleo Digital"
    );

    let report = app_state.sync_service().run(&data).await?;
    println!("{report:#?}");
    Ok(())
}

async fn create_admin(app_state: AppState, args: CreateAdminArgs) -> Result<()> {
    let password_hash = hash_password(&args.password).await?;
    let user = app_state
        .user_service
        .bootstrap_admin(&NewUser {
            username: &args.username,
            first_name: &args.first_name,
            last_name: &args.last_name,
            email: &args.email,
            password_hash: &password_hash,
        })
        .await?;

    println!("Administrador criado: {} (id {})", user.email, user.id);
    Ok(())
}
