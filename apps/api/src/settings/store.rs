use anyhow::Result;
use serde::Deserialize;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::settings::SettingsRow;

/// Full replacement of the business baseline. Omitted fields are cleared.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub average_order_value: Option<f64>,
    pub customer_lifetime_value: Option<f64>,
    pub monthly_marketing_budget: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub currency: Option<String>,
}

impl SettingsUpdate {
    pub fn validate(self) -> Result<Self, AppError> {
        let money = [
            ("averageOrderValue", self.average_order_value),
            ("customerLifetimeValue", self.customer_lifetime_value),
            ("monthlyMarketingBudget", self.monthly_marketing_budget),
        ];
        for (field, value) in money {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AppError::Validation(format!(
                        "{field} must be a non-negative number"
                    )));
                }
            }
        }
        if let Some(rate) = self.conversion_rate {
            if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
                return Err(AppError::Validation(
                    "conversionRate must be a percentage between 0 and 100".to_string(),
                ));
            }
        }
        if let Some(currency) = &self.currency {
            let c = currency.trim();
            if c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(AppError::Validation(
                    "currency must be a 3-letter code".to_string(),
                ));
            }
        }
        Ok(self)
    }

    fn currency_code(&self) -> String {
        self.currency
            .as_deref()
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_else(|| "USD".to_string())
    }
}

pub async fn get_settings(pool: &PgPool) -> Result<Option<SettingsRow>> {
    Ok(sqlx::query_as::<_, SettingsRow>("SELECT * FROM settings WHERE singleton")
        .fetch_optional(pool)
        .await?)
}

/// Upserts the singleton row. Concurrent writers race; the last one wins.
pub async fn upsert_settings(pool: &PgPool, update: &SettingsUpdate) -> Result<SettingsRow> {
    Ok(sqlx::query_as::<_, SettingsRow>(
        r#"
        INSERT INTO settings
            (singleton, average_order_value, customer_lifetime_value,
             monthly_marketing_budget, conversion_rate, currency, updated_at)
        VALUES (TRUE, $1, $2, $3, $4, $5, now())
        ON CONFLICT (singleton) DO UPDATE SET
            average_order_value      = EXCLUDED.average_order_value,
            customer_lifetime_value  = EXCLUDED.customer_lifetime_value,
            monthly_marketing_budget = EXCLUDED.monthly_marketing_budget,
            conversion_rate          = EXCLUDED.conversion_rate,
            currency                 = EXCLUDED.currency,
            updated_at               = now()
        RETURNING *
        "#,
    )
    .bind(update.average_order_value)
    .bind(update.customer_lifetime_value)
    .bind(update.monthly_marketing_budget)
    .bind(update.conversion_rate)
    .bind(update.currency_code())
    .fetch_one(pool)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> SettingsUpdate {
        SettingsUpdate {
            average_order_value: Some(55.0),
            customer_lifetime_value: Some(400.0),
            monthly_marketing_budget: None,
            conversion_rate: Some(2.5),
            currency: Some("eur".to_string()),
        }
    }

    #[test]
    fn test_valid_update_passes() {
        let u = update().validate().unwrap();
        assert_eq!(u.currency_code(), "EUR");
    }

    #[test]
    fn test_negative_money_rejected() {
        let mut u = update();
        u.average_order_value = Some(-1.0);
        assert!(matches!(u.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_conversion_rate_is_a_percentage() {
        let mut u = update();
        u.conversion_rate = Some(140.0);
        assert!(u.validate().is_err());
    }

    #[test]
    fn test_currency_defaults_to_usd() {
        let mut u = update();
        u.currency = None;
        assert_eq!(u.currency_code(), "USD");
    }

    #[test]
    fn test_bad_currency_rejected() {
        let mut u = update();
        u.currency = Some("dollars".to_string());
        assert!(u.validate().is_err());
    }
}
