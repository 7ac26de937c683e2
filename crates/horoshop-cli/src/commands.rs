//! Argument parsing and command execution.

use anyhow::{anyhow, bail, Result};
use horoshop_core::{ApiClient, CatalogQuery, OrderFilters};
use serde_json::{json, Value};

pub const USAGE: &str = "\
Usage: horoshop <command> [args]

Commands:
  order <id>               Show one order
  orders [id...]           List orders, optionally restricted to ids
  catalog [limit]          Export catalog entries (default limit 20)
  product <article>        Show one product by article
  bind <event> <url>       Subscribe a webhook, prints the subscription id
  unbind <id> <url>        Remove a webhook subscription
  help                     Show this message";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Order(i64),
    Orders(Vec<i64>),
    Catalog(Option<u32>),
    Product(String),
    Bind { event: String, url: String },
    Unbind { id: i64, url: String },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let (name, rest) = match args.split_first() {
            Some((name, rest)) => (name.as_str(), rest),
            None => return Ok(Command::Help),
        };

        let command = match (name, rest) {
            ("order", [id]) => Command::Order(parse_id(id)?),
            ("orders", ids) => Command::Orders(ids.iter().map(|id| parse_id(id)).collect::<Result<_>>()?),
            ("catalog", []) => Command::Catalog(None),
            ("catalog", [limit]) => Command::Catalog(Some(
                limit
                    .parse()
                    .map_err(|_| anyhow!("Invalid limit: {}", limit))?,
            )),
            ("product", [article]) => Command::Product(article.clone()),
            ("bind", [event, url]) => Command::Bind {
                event: event.clone(),
                url: url.clone(),
            },
            ("unbind", [id, url]) => Command::Unbind {
                id: parse_id(id)?,
                url: url.clone(),
            },
            ("help" | "--help" | "-h", _) => Command::Help,
            _ => bail!("Unknown command or wrong arguments: {}", args.join(" ")),
        };
        Ok(command)
    }

    /// Run the command and return its JSON output
    pub async fn run(&self, client: &ApiClient) -> Result<Value> {
        let output = match self {
            Command::Order(id) => serde_json::to_value(client.get_order_by_id(*id).await?)?,
            Command::Orders(ids) => {
                let orders = client.list_orders(ids, &OrderFilters::default()).await?;
                serde_json::to_value(orders)?
            }
            Command::Catalog(limit) => {
                let mut query = CatalogQuery::default();
                if let Some(limit) = limit {
                    query = query.limit(*limit);
                }
                serde_json::to_value(client.list_catalog(&query).await?)?
            }
            Command::Product(article) => {
                serde_json::to_value(client.get_product_by_article(article).await?)?
            }
            Command::Bind { event, url } => {
                let id = client.bind(event, url).await?;
                json!({ "id": id })
            }
            Command::Unbind { id, url } => {
                let removed = client.unbind(*id, url).await?;
                json!({ "removed": removed })
            }
            Command::Help => Value::String(USAGE.to_string()),
        };
        Ok(output)
    }
}

fn parse_id(value: &str) -> Result<i64> {
    value.parse().map_err(|_| anyhow!("Invalid id: {}", value))
}
