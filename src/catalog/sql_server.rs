//! SQL Server connection backed by tiberius
//!
//! tiberius is async; the scaffolder is synchronous. Each connection owns a
//! current-thread tokio runtime and blocks on every round trip.

use rust_decimal::Decimal;
use tiberius::{Client, ColumnData, Config, Row};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::connection::{CatalogConnection, CatalogRow, SqlValue};
use crate::error::ScaffoldError;

type SqlClient = Client<Compat<TcpStream>>;

/// Catalog connection to a live SQL Server
pub struct TiberiusConnection {
    config: Config,
    runtime: Runtime,
    client: Option<SqlClient>,
}

impl TiberiusConnection {
    pub fn new(config: Config) -> Result<Self, ScaffoldError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            config,
            runtime,
            client: None,
        })
    }

    /// Build from an ADO.NET style connection string
    /// (`Server=tcp:host,1433;Database=db;User Id=sa;Password=...`)
    pub fn from_ado_string(connection_string: &str) -> Result<Self, ScaffoldError> {
        Self::new(Config::from_ado_string(connection_string)?)
    }
}

async fn connect(config: Config) -> tiberius::Result<SqlClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure SQL gateways redirect to the node that hosts the database
        Err(tiberius::error::Error::Routing { host, port }) => {
            let mut config = config;
            config.host(&host);
            config.port(port);
            let tcp = TcpStream::connect(config.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Client::connect(config, tcp.compat_write()).await
        }
        Err(err) => Err(err),
    }
}

impl CatalogConnection for TiberiusConnection {
    fn is_open(&self) -> bool {
        self.client.is_some()
    }

    fn open(&mut self) -> Result<(), ScaffoldError> {
        let client = self.runtime.block_on(connect(self.config.clone()))?;
        tracing::debug!(addr = %self.config.get_addr(), "opened SQL Server connection");
        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ScaffoldError> {
        if let Some(client) = self.client.take() {
            self.runtime.block_on(client.close())?;
            tracing::debug!("closed SQL Server connection");
        }
        Ok(())
    }

    fn query(&mut self, sql: &str) -> Result<Vec<CatalogRow>, ScaffoldError> {
        let Self {
            runtime, client, ..
        } = self;
        let client = client.as_mut().ok_or_else(|| ScaffoldError::Connection {
            message: "connection is not open".to_string(),
        })?;

        tracing::trace!(sql, "executing catalog query");
        let rows = runtime
            .block_on(async { client.simple_query(sql).await?.into_first_result().await })
            .map_err(|err| ScaffoldError::Query {
                sql: sql.to_string(),
                message: err.to_string(),
            })?;

        Ok(rows.into_iter().map(convert_row).collect())
    }
}

fn convert_row(row: Row) -> CatalogRow {
    let names: Vec<String> = row
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut converted = CatalogRow::new();
    for (name, data) in names.into_iter().zip(row) {
        converted.push(name, convert_value(data));
    }
    converted
}

/// Catalog queries only return integers, bits, strings and decimals;
/// anything else reads as NULL.
fn convert_value(data: ColumnData<'static>) -> SqlValue {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| SqlValue::Int(v.into())),
        ColumnData::I16(v) => v.map(|v| SqlValue::Int(v.into())),
        ColumnData::I32(v) => v.map(|v| SqlValue::Int(v.into())),
        ColumnData::I64(v) => v.map(SqlValue::Int),
        ColumnData::F32(v) => v.map(|v| SqlValue::Float(v.into())),
        ColumnData::F64(v) => v.map(SqlValue::Float),
        ColumnData::Bit(v) => v.map(SqlValue::Bool),
        ColumnData::String(v) => v.map(|s| SqlValue::String(s.into_owned())),
        // Scales above 28 do not fit rust_decimal and read as NULL.
        ColumnData::Numeric(v) => v.and_then(|n| {
            Decimal::try_from_i128_with_scale(n.value(), n.scale().into())
                .ok()
                .map(SqlValue::Decimal)
        }),
        _ => None,
    };
    value.unwrap_or(SqlValue::Null)
}
