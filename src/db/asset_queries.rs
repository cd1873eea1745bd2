use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Asset, AssetMarket, AssetUpsert, Currency, PriceTriple};
use crate::services::currency_service::CurrencyRates;

const ASSET_COLUMNS: &str = "id, ticker, name, market, currency, price_try, price_usd, price_eur, \
     icon, scraped_at, created_at, updated_at";

pub const SORTABLE_COLUMNS: &[&str] = &[
    "ticker",
    "name",
    "market",
    "price_try",
    "price_usd",
    "price_eur",
    "scraped_at",
    "created_at",
];

#[derive(Debug, Default, Clone)]
pub struct AssetFilter {
    pub market: Option<AssetMarket>,
    pub search: Option<String>,
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AssetFilter) {
    qb.push(" WHERE TRUE");
    if let Some(market) = filter.market {
        qb.push(" AND market = ").push_bind(market.as_str());
    }
    if let Some(search) = &filter.search {
        let like = format!("%{}%", search);
        qb.push(" AND (ticker ILIKE ")
            .push_bind(like.clone())
            .push(" OR name ILIKE ")
            .push_bind(like)
            .push(")");
    }
}

pub async fn fetch_page(
    pool: &PgPool,
    filter: &AssetFilter,
    order_by: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Asset>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM assets", ASSET_COLUMNS));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY ")
        .push(order_by)
        .push(" LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb.build_query_as::<Asset>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, filter: &AssetFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM assets");
    push_filters(&mut qb, filter);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn fetch_one(pool: &PgPool, id: Uuid) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!("SELECT {} FROM assets WHERE id = $1", ASSET_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!("SELECT {} FROM assets WHERE id = ANY($1)", ASSET_COLUMNS))
        .bind(ids)
        .fetch_all(pool)
        .await
}

pub async fn fetch_by_tickers(pool: &PgPool, tickers: &[&str]) -> Result<Vec<Asset>, sqlx::Error> {
    let tickers: Vec<String> = tickers.iter().map(|t| t.to_string()).collect();
    sqlx::query_as::<_, Asset>(&format!(
        "SELECT {} FROM assets WHERE ticker = ANY($1) ORDER BY ticker",
        ASSET_COLUMNS
    ))
    .bind(tickers)
    .fetch_all(pool)
    .await
}

pub async fn fetch_by_ticker(
    pool: &PgPool,
    ticker: &str,
    market: AssetMarket,
) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "SELECT {} FROM assets WHERE ticker = $1 AND market = $2",
        ASSET_COLUMNS
    ))
    .bind(ticker)
    .bind(market.as_str())
    .fetch_optional(pool)
    .await
}

pub async fn insert(pool: &PgPool, asset: &AssetUpsert) -> Result<Asset, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "INSERT INTO assets (ticker, name, market, currency, price_try, price_usd, price_eur, icon)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING {}",
        ASSET_COLUMNS
    ))
    .bind(&asset.ticker)
    .bind(&asset.name)
    .bind(asset.market.as_str())
    .bind(asset.currency.as_str())
    .bind(asset.price.try_)
    .bind(asset.price.usd)
    .bind(asset.price.eur)
    .bind(&asset.icon)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    icon: &str,
    currency: Currency,
    price: PriceTriple,
) -> Result<Option<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "UPDATE assets
         SET name = $2, icon = $3, currency = $4,
             price_try = $5, price_usd = $6, price_eur = $7,
             updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        ASSET_COLUMNS
    ))
    .bind(id)
    .bind(name)
    .bind(icon)
    .bind(currency.as_str())
    .bind(price.try_)
    .bind(price.usd)
    .bind(price.eur)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM assets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Inserts or refreshes a batch keyed by `(ticker, market)`. The batch must
/// not contain the same key twice. An empty icon never overwrites a stored one.
pub async fn upsert_batch<'e, E>(executor: E, batch: &[AssetUpsert]) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if batch.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO assets (ticker, name, market, currency, price_try, price_usd, price_eur, icon, scraped_at) ",
    );
    qb.push_values(batch, |mut row, asset| {
        row.push_bind(&asset.ticker)
            .push_bind(&asset.name)
            .push_bind(asset.market.as_str())
            .push_bind(asset.currency.as_str())
            .push_bind(asset.price.try_)
            .push_bind(asset.price.usd)
            .push_bind(asset.price.eur)
            .push_bind(&asset.icon)
            .push("NOW()");
    });
    qb.push(
        " ON CONFLICT (ticker, market) DO UPDATE SET
            name = CASE WHEN EXCLUDED.name <> '' THEN EXCLUDED.name ELSE assets.name END,
            currency = EXCLUDED.currency,
            price_try = EXCLUDED.price_try,
            price_usd = EXCLUDED.price_usd,
            price_eur = EXCLUDED.price_eur,
            icon = CASE WHEN EXCLUDED.icon <> '' THEN EXCLUDED.icon ELSE assets.icon END,
            scraped_at = NOW(),
            updated_at = NOW()",
    );

    let result = qb.build().execute(executor).await?;
    Ok(result.rows_affected())
}

/// Recomputes every stored price from the asset's native-currency price.
pub async fn reprice_all(pool: &PgPool, rates: &CurrencyRates) -> Result<u64, sqlx::Error> {
    const NATIVE: &str =
        "(CASE currency WHEN 'try' THEN price_try WHEN 'usd' THEN price_usd ELSE price_eur END)";

    let sql = format!(
        "UPDATE assets SET
            price_try = {native} * (CASE currency WHEN 'try' THEN $1 WHEN 'usd' THEN $2 ELSE $3 END),
            price_usd = {native} * (CASE currency WHEN 'try' THEN $4 WHEN 'usd' THEN $5 ELSE $6 END),
            price_eur = {native} * (CASE currency WHEN 'try' THEN $7 WHEN 'usd' THEN $8 ELSE $9 END),
            updated_at = NOW()",
        native = NATIVE
    );

    let mut query = sqlx::query(&sql);
    for factor in reprice_factors(rates) {
        query = query.bind(factor);
    }
    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// Bind values of `reprice_all`: `$1..$3` convert try/usd/eur into TRY,
/// `$4..$6` into USD and `$7..$9` into EUR.
pub fn reprice_factors(rates: &CurrencyRates) -> [f64; 9] {
    let mut factors = [0.0; 9];
    for (i, to) in Currency::ALL.iter().enumerate() {
        for (j, from) in Currency::ALL.iter().enumerate() {
            factors[i * 3 + j] = rates.rate(*from, *to);
        }
    }
    factors
}

/// The USD and EUR exchange assets that carry the current TRY rates.
pub async fn fetch_rate_assets(pool: &PgPool) -> Result<Vec<Asset>, sqlx::Error> {
    sqlx::query_as::<_, Asset>(&format!(
        "SELECT {} FROM assets WHERE market = 'exchange' AND ticker IN ('USD', 'EUR')",
        ASSET_COLUMNS
    ))
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprice_factors_follow_placeholder_order() {
        let rates = CurrencyRates::new(34.0, 37.0).unwrap();
        let expected = [
            1.0,
            34.0,
            37.0,
            1.0 / 34.0,
            1.0,
            37.0 / 34.0,
            1.0 / 37.0,
            34.0 / 37.0,
            1.0,
        ];
        for (got, want) in reprice_factors(&rates).iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
    }

    #[test]
    fn currency_labels_match_reprice_case_arms() {
        let labels: Vec<&str> = Currency::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(labels, ["try", "usd", "eur"]);
    }
}
