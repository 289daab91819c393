//! Benefits / welfare system

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::gateway::{GatewayCore, GatewayRequest};
use crate::policy::EndpointDescriptor;
use crate::types::{Classification, Operation, Result, ServiceIdentifier};

/// Beneficiary status lookup; identifiers travel only in the encrypted body
pub fn verify_beneficiary_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::BenefitsSystem, "/beneficiaries/verify", Classification::Confidential)
        .encrypted()
        .secure_route()
        .government_data()
        .personal_data()
}

/// Published payment calendar
pub fn payment_schedules_endpoint() -> EndpointDescriptor {
    EndpointDescriptor::new(ServiceIdentifier::BenefitsSystem, "/payment-schedules", Classification::Public)
        .read_only()
        .government_data()
}

/// Result of a beneficiary verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryVerification {
    /// Beneficiary is enrolled and active
    pub is_valid: bool,
    /// Benefit programme
    #[serde(default)]
    pub benefit_type: Option<String>,
    /// Enrolment status
    #[serde(default)]
    pub status: Option<String>,
    /// Last day of the current entitlement
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

/// One scheduled payment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchedule {
    /// Programme
    pub program: String,
    /// Payment date
    pub payment_date: NaiveDate,
}

#[derive(Deserialize)]
struct PaymentSchedules {
    schedules: Vec<PaymentSchedule>,
}

/// Verify a beneficiary by identifier
pub async fn verify_beneficiary(gateway: &GatewayCore, beneficiary_id: &str) -> Result<BeneficiaryVerification> {
    let request = GatewayRequest::post(verify_beneficiary_endpoint(), json!({ "beneficiaryId": beneficiary_id }))
        .with_operation(Operation::Read);
    gateway.call_typed(request).await
}

/// Payment schedule for a programme, optionally limited to one month (`YYYY-MM`)
pub async fn payment_schedules(
    gateway: &GatewayCore,
    program: &str,
    month: Option<&str>,
) -> Result<Vec<PaymentSchedule>> {
    let mut request = GatewayRequest::get(payment_schedules_endpoint()).with_param("program", program);
    if let Some(month) = month {
        request = request.with_param("month", month);
    }
    let response: PaymentSchedules = gateway.call_typed(request).await?;
    Ok(response.schedules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditOutcome;
    use crate::gateway::test_support::*;
    use crate::transport::MockTransport;
    use http::StatusCode;

    #[tokio::test]
    async fn test_verify_beneficiary() {
        let fx = initialized(encrypted_responder(|request| {
            assert_eq!(request["beneficiaryId"], "BEN-1001");
            json!({"isValid": true, "benefitType": "housing", "status": "active", "validUntil": "2027-03-31"})
        }));

        let result = verify_beneficiary(&fx.gateway, "BEN-1001").await.unwrap();
        assert!(result.is_valid);
        assert_eq!(result.benefit_type.as_deref(), Some("housing"));
        assert_eq!(result.valid_until, NaiveDate::from_ymd_opt(2027, 3, 31));

        let records = fx.audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AuditOutcome::Success);
        assert_eq!(records[0].classification, Classification::Confidential);
        assert_eq!(records[0].retention_days, Some(2555));
        assert!(fx.transport.requests()[0].secure_route);
    }

    #[tokio::test]
    async fn test_verify_beneficiary_requires_credential() {
        let fx = fixture(MockTransport::json(StatusCode::OK, json!({"isValid": true})));
        assert!(verify_beneficiary(&fx.gateway, "BEN-1001").await.is_err());
        assert_eq!(fx.transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_payment_schedules_cached() {
        let fx = fixture(MockTransport::json(
            StatusCode::OK,
            json!({"schedules": [{"program": "pension", "paymentDate": "2026-11-02"}]}),
        ));

        let first = payment_schedules(&fx.gateway, "pension", Some("2026-11")).await.unwrap();
        let second = payment_schedules(&fx.gateway, "pension", Some("2026-11")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].payment_date, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(fx.transport.call_count(), 1);
        assert_eq!(fx.audit.records().iter().filter(|r| r.cache_hit).count(), 1);
    }
}
