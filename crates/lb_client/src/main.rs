use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use lb_client::{ClientConfig, SyncClient};
use lb_proto::{Account, Binary, Card, Note, Payload, Record, RecordType};

#[derive(Parser, Debug)]
#[command(author, version, about = "Lockbox secret manager client", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "LOCKBOX_CFG", default_value = "lockbox.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register the configured user on the server
    Register,
    /// Check the configured credentials
    Verify,
    /// Encrypt and store a new record
    Store {
        #[arg(long = "type")]
        record_type: RecordType,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        meta: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Fetch and decrypt a record
    Get {
        #[command(flatten)]
        target: Target,
        /// Write a binary record's bytes to this file
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Replace a record, addressed by --id or by --type and --name
    Update {
        #[arg(long)]
        id: Option<i64>,
        #[arg(long = "type")]
        record_type: RecordType,
        #[arg(long)]
        name: String,
        /// Rename the record
        #[arg(long)]
        new_name: Option<String>,
        #[arg(long, default_value = "")]
        meta: String,
        #[command(flatten)]
        payload: PayloadArgs,
    },
    /// Delete a record
    Delete {
        #[command(flatten)]
        target: Target,
    },
    /// List record names
    List {
        #[arg(long = "type")]
        record_type: Option<RecordType>,
    },
}

#[derive(Args, Debug)]
struct Target {
    #[arg(long, conflicts_with_all = ["record_type", "name"])]
    id: Option<i64>,
    #[arg(long = "type", requires = "name")]
    record_type: Option<RecordType>,
    #[arg(long, requires = "record_type")]
    name: Option<String>,
}

#[derive(Args, Debug, Default)]
struct PayloadArgs {
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    holder: Option<String>,
    #[arg(long)]
    number: Option<String>,
    #[arg(long)]
    exp_month: Option<u8>,
    #[arg(long)]
    exp_year: Option<u16>,
    #[arg(long)]
    cvc: Option<String>,
    /// Read a binary record's bytes from this file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl PayloadArgs {
    fn into_payload(self, record_type: RecordType) -> Result<Payload> {
        Ok(match record_type {
            RecordType::Account => Payload::Account(Account {
                url: self.url.unwrap_or_default(),
                user_name: self.user.unwrap_or_default(),
                password: self.password.unwrap_or_default(),
            }),
            RecordType::Note => Payload::Note(Note {
                text: self.text.unwrap_or_default(),
            }),
            RecordType::Card => Payload::Card(Card {
                holder: self.holder.unwrap_or_default(),
                number: self.number.unwrap_or_default(),
                exp_month: self.exp_month.unwrap_or_default(),
                exp_year: self.exp_year.unwrap_or_default(),
                cvc: self.cvc.unwrap_or_default(),
            }),
            RecordType::Binary => {
                let path = self
                    .file
                    .ok_or_else(|| anyhow!("binary records need --file"))?;
                let data = std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Payload::Binary(Binary { data })
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lockbox=warn".parse()?)
                .add_directive("lb_client=warn".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::load(&cli.config)?;
    let client = SyncClient::connect(&config).await?;
    let result = run(&client, cli.command).await;
    client.cache().close().await;
    result
}

async fn run(client: &SyncClient, command: Commands) -> Result<()> {
    match command {
        Commands::Register => {
            let id = client.register().await?;
            println!("registered, user id {id}");
        }
        Commands::Verify => {
            client.verify().await?;
            println!("credentials OK");
        }
        Commands::Store {
            record_type,
            name,
            meta,
            payload,
        } => {
            let record = Record::seal(name, meta, &payload.into_payload(record_type)?)?;
            let id = client.store(&record).await?;
            println!("stored {} {}, id {id}", record.record_type, record.name);
        }
        Commands::Get { target, file } => {
            let record = match target.resolve()? {
                Selector::Id(id) => client.get(id).await?,
                Selector::Name(t, name) => client.get_by_type_name(t, &name).await?,
            };
            print_record(&record, file.as_deref())?;
        }
        Commands::Update {
            id,
            record_type,
            name,
            new_name,
            meta,
            payload,
        } => {
            let target_name = new_name.unwrap_or_else(|| name.clone());
            let record = Record::seal(target_name, meta, &payload.into_payload(record_type)?)?;
            let id = match id {
                Some(id) => {
                    client.update(id, &record).await?;
                    id
                }
                None => client.update_by_type_name(record_type, &name, &record).await?,
            };
            println!("updated {record_type} {}, id {id}", record.name);
        }
        Commands::Delete { target } => match target.resolve()? {
            Selector::Id(id) => {
                client.delete(id).await?;
                println!("deleted id {id}");
            }
            Selector::Name(t, name) => {
                let id = client.delete_by_type_name(t, &name).await?;
                println!("deleted {t} {name}, id {id}");
            }
        },
        Commands::List { record_type } => {
            let records = client.list(record_type).await?;
            if records.is_empty() {
                println!("no records");
            }
            for (id, record) in &records {
                println!("{id:>6}  {:<8} {}", record.record_type, record.name);
            }
        }
    }
    Ok(())
}

enum Selector {
    Id(i64),
    Name(RecordType, String),
}

impl Target {
    fn resolve(self) -> Result<Selector> {
        match (self.id, self.record_type, self.name) {
            (Some(id), _, _) => Ok(Selector::Id(id)),
            (None, Some(t), Some(name)) => Ok(Selector::Name(t, name)),
            _ => bail!("give either --id or both --type and --name"),
        }
    }
}

fn print_record(record: &Record, file: Option<&Path>) -> Result<()> {
    println!("id:    {}", record.id);
    println!("type:  {}", record.record_type);
    println!("name:  {}", record.name);
    if !record.meta.is_empty() {
        println!("meta:  {}", record.meta);
    }
    match record.payload()? {
        Payload::Account(a) => {
            println!("url:      {}", a.url);
            println!("user:     {}", a.user_name);
            println!("password: {}", a.password);
        }
        Payload::Note(n) => println!("text:  {}", n.text),
        Payload::Card(c) => {
            println!("holder:  {}", c.holder);
            println!("number:  {}", c.number);
            println!("expires: {:02}/{}", c.exp_month, c.exp_year);
            println!("cvc:     {}", c.cvc);
        }
        Payload::Binary(b) => match file {
            Some(path) => {
                std::fs::write(path, &b.data)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("wrote {} bytes to {}", b.data.len(), path.display());
            }
            None => println!("data:  {} bytes (use --file to save)", b.data.len()),
        },
    }
    Ok(())
}
