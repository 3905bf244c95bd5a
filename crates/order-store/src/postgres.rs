use async_trait::async_trait;
use chrono::{Duration, Utc};
use domain::{
    DeliveryAddress, ExtraAttribute, LineItem, NewOrder, Order, OrderAggregate, OrderStatus,
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{OrderStore, StatusUpdate},
    token,
};

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

const HEADER_COLUMNS: &str = "id, mol_kunde_id, rechnungsadresse_id, mol_zahlart_id, \
     bestelldatum, bestellreferenz, seite, bestellfreigabe, mol_verkaufskanal_id, \
     versand_einstellung_id, email, \
     liefer_anrede, liefer_vorname, liefer_nachname, liefer_zusatz, liefer_strasse, \
     liefer_hausnummer, liefer_adresszeile1, liefer_adresszeile2, liefer_adresszeile3, \
     liefer_plz, liefer_ort, liefer_land, liefer_land_iso, liefer_tel, \
     status, tracking_nummer, versand_dienstleister, versand_datum, uebermittlung_status";

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: row.try_get("id")?,
            customer_ref: row.try_get("mol_kunde_id")?,
            billing_address_ref: row.try_get("rechnungsadresse_id")?,
            payment_method_ref: row.try_get("mol_zahlart_id")?,
            order_date: row.try_get("bestelldatum")?,
            order_reference: row.try_get("bestellreferenz")?,
            storefront_page: row.try_get("seite")?,
            release_flag: row.try_get("bestellfreigabe")?,
            sales_channel_ref: row.try_get("mol_verkaufskanal_id")?,
            shipping_config_ref: row.try_get("versand_einstellung_id")?,
            email: row.try_get("email")?,
            delivery_address: DeliveryAddress {
                salutation: row.try_get("liefer_anrede")?,
                first_name: row.try_get("liefer_vorname")?,
                last_name: row.try_get("liefer_nachname")?,
                addition: row.try_get("liefer_zusatz")?,
                street: row.try_get("liefer_strasse")?,
                house_number: row.try_get("liefer_hausnummer")?,
                line_1: row.try_get("liefer_adresszeile1")?,
                line_2: row.try_get("liefer_adresszeile2")?,
                line_3: row.try_get("liefer_adresszeile3")?,
                postal_code: row.try_get("liefer_plz")?,
                city: row.try_get("liefer_ort")?,
                country: row.try_get("liefer_land")?,
                country_iso: row.try_get("liefer_land_iso")?,
                phone: row.try_get("liefer_tel")?,
            },
            status: status.parse()?,
            tracking_number: row.try_get("tracking_nummer")?,
            carrier: row.try_get("versand_dienstleister")?,
            shipped_at: row.try_get("versand_datum")?,
            submission_status: row.try_get("uebermittlung_status")?,
        })
    }

    fn row_to_line_item(row: PgRow) -> Result<LineItem> {
        Ok(LineItem {
            id: row.try_get("id")?,
            order_id: row.try_get("bestell_id")?,
            ean: row.try_get("ean")?,
            description: row.try_get("bezeichnung")?,
            quantity: row.try_get("menge")?,
            net_cost: row.try_get("ek_netto")?,
            gross_price: row.try_get("vk_brutto")?,
            reference: row.try_get("referenz")?,
        })
    }

    fn row_to_extra(row: PgRow) -> Result<ExtraAttribute> {
        Ok(ExtraAttribute {
            id: row.try_get("id")?,
            order_id: row.try_get("bestell_id")?,
            kind: row.try_get("typ")?,
            value: row.try_get("value")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order))]
    async fn create(&self, order: NewOrder) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let addr = &order.delivery_address;

        // Header first: the generated id must be visible before any child
        // insert runs, all on the same transaction.
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO bestellungen (
                mol_kunde_id, rechnungsadresse_id, mol_zahlart_id,
                bestelldatum, bestellreferenz, seite, bestellfreigabe,
                mol_verkaufskanal_id, versand_einstellung_id, email,
                liefer_anrede, liefer_vorname, liefer_nachname, liefer_zusatz,
                liefer_strasse, liefer_hausnummer,
                liefer_adresszeile1, liefer_adresszeile2, liefer_adresszeile3,
                liefer_plz, liefer_ort, liefer_land, liefer_land_iso, liefer_tel,
                status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19,
                    $20, $21, $22, $23, $24, $25)
            RETURNING id
            "#,
        )
        .bind(order.customer_ref)
        .bind(order.billing_address_ref)
        .bind(order.payment_method_ref)
        .bind(&order.order_date)
        .bind(&order.order_reference)
        .bind(&order.storefront_page)
        .bind(order.release_flag)
        .bind(order.sales_channel_ref)
        .bind(order.shipping_config_ref)
        .bind(&order.email)
        .bind(&addr.salutation)
        .bind(&addr.first_name)
        .bind(&addr.last_name)
        .bind(&addr.addition)
        .bind(&addr.street)
        .bind(&addr.house_number)
        .bind(&addr.line_1)
        .bind(&addr.line_2)
        .bind(&addr.line_3)
        .bind(&addr.postal_code)
        .bind(&addr.city)
        .bind(&addr.country)
        .bind(&addr.country_iso)
        .bind(&addr.phone)
        .bind(OrderStatus::New.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.line_items {
            sqlx::query(
                r#"
                INSERT INTO bestell_positionen (
                    bestell_id, ean, bezeichnung, menge, ek_netto, vk_brutto, referenz
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order_id)
            .bind(&item.ean)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.net_cost)
            .bind(item.gross_price)
            .bind(&item.reference)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("menge_nicht_negativ")
                {
                    return StoreError::InvalidQuantity(item.quantity);
                }
                StoreError::Database(e)
            })?;
        }

        for extra in &order.extras {
            sqlx::query(
                r#"
                INSERT INTO bestell_zusatz (bestell_id, typ, value)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(order_id)
            .bind(&extra.kind)
            .bind(&extra.value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        metrics::counter!("orders_created_total").increment(1);
        Ok(order_id)
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, order_id: i64) -> Result<OrderAggregate> {
        let header_row = sqlx::query(&format!(
            "SELECT {HEADER_COLUMNS} FROM bestellungen WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::OrderNotFound(order_id))?;

        let item_rows = sqlx::query(
            r#"
            SELECT id, bestell_id, ean, bezeichnung, menge, ek_netto, vk_brutto, referenz
            FROM bestell_positionen
            WHERE bestell_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let extra_rows = sqlx::query(
            r#"
            SELECT id, bestell_id, typ, value
            FROM bestell_zusatz
            WHERE bestell_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderAggregate {
            header: Self::row_to_order(header_row)?,
            line_items: item_rows
                .into_iter()
                .map(Self::row_to_line_item)
                .collect::<Result<_>>()?,
            extras: extra_rows
                .into_iter()
                .map(Self::row_to_extra)
                .collect::<Result<_>>()?,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {HEADER_COLUMNS} FROM bestellungen ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, order_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM bestellungen WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_status(&self, order_id: i64, update: StatusUpdate) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let current: String =
            sqlx::query_scalar("SELECT status FROM bestellungen WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::OrderNotFound(order_id))?;
        let current: OrderStatus = current.parse()?;

        let next = update.status.unwrap_or(current);
        if !current.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE bestellungen
            SET status = $2,
                tracking_nummer = COALESCE($3, tracking_nummer),
                versand_dienstleister = COALESCE($4, versand_dienstleister),
                versand_datum = $5
            WHERE id = $1
            RETURNING {HEADER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(next.as_str())
        .bind(&update.tracking_number)
        .bind(&update.carrier)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::row_to_order(row)
    }

    #[tracing::instrument(skip(self))]
    async fn record_submission(&self, order_id: i64, status: &str) -> Result<()> {
        let result = sqlx::query("UPDATE bestellungen SET uebermittlung_status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn issue_cancel_token(&self, order_id: i64) -> Result<String> {
        let token = token::generate();
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO storno_tokens (bestell_id, token, created, expires)
            SELECT id, $2, $3, $4 FROM bestellungen WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(&token)
        .bind(now)
        .bind(now + Duration::days(token::CANCEL_TOKEN_TTL_DAYS))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(token)
    }

    #[tracing::instrument(skip(self, token))]
    async fn redeem_cancel_token(&self, token: &str) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT bestell_id, expires, consumed FROM storno_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::TokenNotFound)?;

        let order_id: i64 = row.try_get("bestell_id")?;
        let expires: chrono::DateTime<Utc> = row.try_get("expires")?;
        let consumed: bool = row.try_get("consumed")?;

        if consumed {
            return Err(StoreError::TokenConsumed);
        }
        if expires < Utc::now() {
            return Err(StoreError::TokenExpired);
        }

        sqlx::query("UPDATE storno_tokens SET consumed = TRUE WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order_id)
    }

    #[tracing::instrument(skip(self, token))]
    async fn cancel_order(&self, token: &str) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT bestell_id, expires, consumed FROM storno_tokens WHERE token = $1 FOR UPDATE",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::TokenNotFound)?;

        let order_id: i64 = row.try_get("bestell_id")?;
        let expires: chrono::DateTime<Utc> = row.try_get("expires")?;
        let consumed: bool = row.try_get("consumed")?;

        if consumed {
            return Err(StoreError::TokenConsumed);
        }
        if expires < Utc::now() {
            return Err(StoreError::TokenExpired);
        }

        let current: String =
            sqlx::query_scalar("SELECT status FROM bestellungen WHERE id = $1 FOR UPDATE")
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::OrderNotFound(order_id))?;
        let current: OrderStatus = current.parse()?;

        // The transition check must come before the token is touched; a
        // dropped transaction leaves the token unconsumed.
        if !current.can_transition_to(OrderStatus::Cancelled) {
            return Err(StoreError::InvalidTransition {
                from: current,
                to: OrderStatus::Cancelled,
            });
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE bestellungen
            SET status = $2, versand_datum = $3
            WHERE id = $1
            RETURNING {HEADER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(OrderStatus::Cancelled.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE storno_tokens SET consumed = TRUE WHERE token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Self::row_to_order(row)
    }
}
