//! Submission payload - the closed wire record sent to the prediction service

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::core::identity::FieldKey;
use crate::core::wizard::AccumulatedData;
use crate::schema::validator::parse_flag;

/// Flattened submission with one field per known key.
///
/// Every value is a string on the wire except `uploadPdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    // Registration
    pub company_name: String,
    pub registration_number: String,
    pub email: String,
    pub password: String,

    // Prediction data
    #[serde(rename = "industryFF12")]
    pub industry: String,
    pub exchange: String,
    pub high_tech: String,
    pub egc: String,
    pub vc: String,
    pub pe: String,
    pub prominence: String,
    pub age: String,
    pub year: String,
    pub n_underwriters: String,
    pub shares_offered_perc: String,
    pub investment_received: String,
    pub amount_on_prospectus: String,
    pub common_equity: String,
    pub sp2weeks_before: String,
    pub blue_sky: String,
    pub management_fee: String,
    pub book_value: String,
    pub total_assets: String,
    pub total_revenue: String,
    pub net_income: String,
    pub roa: String,
    pub leverage: String,
    #[serde(rename = "nVCs")]
    pub n_vcs: String,
    pub n_executives: String,
    pub prior_financing: String,
    pub reputation_lead_max: String,
    pub reputation_avg: String,
    pub n_patents: String,
    pub ipo_size: String,

    // Risk analysis
    pub additional_info: String,
    pub upload_pdf: bool,
}

/// How a missing key is filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRule {
    /// Empty string
    Text,
    /// `"0"`
    Numeric,
    /// `"false"`
    Indicator,
    /// The current calendar year
    CurrentYear,
}

impl DefaultRule {
    /// The rule applied to a field
    pub fn for_field(key: FieldKey) -> Self {
        match key {
            FieldKey::CompanyName
            | FieldKey::RegistrationNumber
            | FieldKey::Email
            | FieldKey::Password
            | FieldKey::Industry
            | FieldKey::Exchange
            | FieldKey::AdditionalInfo => DefaultRule::Text,
            FieldKey::HighTech
            | FieldKey::EmergingGrowth
            | FieldKey::VentureBacked
            | FieldKey::PrivateEquityBacked
            | FieldKey::VcProminence
            | FieldKey::UploadPdf => DefaultRule::Indicator,
            FieldKey::IssueYear => DefaultRule::CurrentYear,
            _ => DefaultRule::Numeric,
        }
    }

    /// The default value for the given year
    pub fn value(&self, year: i32) -> String {
        match self {
            DefaultRule::Text => String::new(),
            DefaultRule::Numeric => "0".to_string(),
            DefaultRule::Indicator => "false".to_string(),
            DefaultRule::CurrentYear => year.to_string(),
        }
    }
}

impl SubmissionPayload {
    /// Flatten accumulated answers, substituting the current year's defaults
    pub fn from_accumulated(data: &AccumulatedData) -> Self {
        Self::from_accumulated_in_year(data, chrono::Local::now().year())
    }

    /// Flatten accumulated answers. Keys that are absent or empty get their
    /// documented default, so the result is always complete.
    pub fn from_accumulated_in_year(data: &AccumulatedData, year: i32) -> Self {
        let get = |key: FieldKey| -> String {
            data.get(&key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| DefaultRule::for_field(key).value(year))
        };

        Self {
            company_name: get(FieldKey::CompanyName),
            registration_number: get(FieldKey::RegistrationNumber),
            email: get(FieldKey::Email),
            password: get(FieldKey::Password),
            industry: get(FieldKey::Industry),
            exchange: get(FieldKey::Exchange),
            high_tech: get(FieldKey::HighTech),
            egc: get(FieldKey::EmergingGrowth),
            vc: get(FieldKey::VentureBacked),
            pe: get(FieldKey::PrivateEquityBacked),
            prominence: get(FieldKey::VcProminence),
            age: get(FieldKey::FirmAge),
            year: get(FieldKey::IssueYear),
            n_underwriters: get(FieldKey::UnderwriterCount),
            shares_offered_perc: get(FieldKey::SharesOfferedPerc),
            investment_received: get(FieldKey::InvestmentReceived),
            amount_on_prospectus: get(FieldKey::AmountOnProspectus),
            common_equity: get(FieldKey::CommonEquity),
            sp2weeks_before: get(FieldKey::Sp2WeeksBefore),
            blue_sky: get(FieldKey::BlueSky),
            management_fee: get(FieldKey::ManagementFee),
            book_value: get(FieldKey::BookValue),
            total_assets: get(FieldKey::TotalAssets),
            total_revenue: get(FieldKey::TotalRevenue),
            net_income: get(FieldKey::NetIncome),
            roa: get(FieldKey::ReturnOnAssets),
            leverage: get(FieldKey::Leverage),
            n_vcs: get(FieldKey::VcCount),
            n_executives: get(FieldKey::ExecutiveCount),
            prior_financing: get(FieldKey::PriorFinancing),
            reputation_lead_max: get(FieldKey::ReputationLeadMax),
            reputation_avg: get(FieldKey::ReputationAvg),
            n_patents: get(FieldKey::PatentCount),
            ipo_size: get(FieldKey::IpoSize),
            additional_info: get(FieldKey::AdditionalInfo),
            upload_pdf: parse_flag(&get(FieldKey::UploadPdf)).unwrap_or(false),
        }
    }

    /// Display value of a field
    pub fn get(&self, key: FieldKey) -> String {
        match key {
            FieldKey::CompanyName => self.company_name.clone(),
            FieldKey::RegistrationNumber => self.registration_number.clone(),
            FieldKey::Email => self.email.clone(),
            FieldKey::Password => self.password.clone(),
            FieldKey::Industry => self.industry.clone(),
            FieldKey::Exchange => self.exchange.clone(),
            FieldKey::HighTech => self.high_tech.clone(),
            FieldKey::EmergingGrowth => self.egc.clone(),
            FieldKey::VentureBacked => self.vc.clone(),
            FieldKey::PrivateEquityBacked => self.pe.clone(),
            FieldKey::VcProminence => self.prominence.clone(),
            FieldKey::FirmAge => self.age.clone(),
            FieldKey::IssueYear => self.year.clone(),
            FieldKey::UnderwriterCount => self.n_underwriters.clone(),
            FieldKey::VcCount => self.n_vcs.clone(),
            FieldKey::ExecutiveCount => self.n_executives.clone(),
            FieldKey::PatentCount => self.n_patents.clone(),
            FieldKey::SharesOfferedPerc => self.shares_offered_perc.clone(),
            FieldKey::InvestmentReceived => self.investment_received.clone(),
            FieldKey::AmountOnProspectus => self.amount_on_prospectus.clone(),
            FieldKey::CommonEquity => self.common_equity.clone(),
            FieldKey::Sp2WeeksBefore => self.sp2weeks_before.clone(),
            FieldKey::BlueSky => self.blue_sky.clone(),
            FieldKey::ManagementFee => self.management_fee.clone(),
            FieldKey::BookValue => self.book_value.clone(),
            FieldKey::TotalAssets => self.total_assets.clone(),
            FieldKey::TotalRevenue => self.total_revenue.clone(),
            FieldKey::NetIncome => self.net_income.clone(),
            FieldKey::ReturnOnAssets => self.roa.clone(),
            FieldKey::Leverage => self.leverage.clone(),
            FieldKey::PriorFinancing => self.prior_financing.clone(),
            FieldKey::ReputationLeadMax => self.reputation_lead_max.clone(),
            FieldKey::ReputationAvg => self.reputation_avg.clone(),
            FieldKey::IpoSize => self.ipo_size.clone(),
            FieldKey::AdditionalInfo => self.additional_info.clone(),
            FieldKey::UploadPdf => self.upload_pdf.to_string(),
        }
    }

    /// All fields in wire order, with secrets left out
    pub fn public_fields(&self) -> Vec<(FieldKey, String)> {
        FieldKey::all()
            .iter()
            .filter(|k| !k.is_secret())
            .map(|k| (*k, self.get(*k)))
            .collect()
    }
}
