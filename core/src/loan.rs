//! Loan model: amortization schedules and debt-service coverage.
//!
//! Financing terms are not stochastic. Every schedule is computed once
//! when the `DebtSchedule` is built and then shared read-only by every
//! trial in the run.

use crate::{
    config::{LoanConfig, ParameterSet, MAX_MONTHS},
    error::ConfigError,
    metric::Metric,
    types::Month,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmortizationType {
    /// Constant payment (annuity); the principal share grows over time.
    FullyAmortizing,
    /// Constant principal; the payment declines with interest.
    FixedPrincipal,
}

/// One scheduled payment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub month:             Month,
    pub interest:          f64,
    pub principal_payment: f64,
    pub remaining_balance: f64,
}

impl ScheduleEntry {
    pub fn payment(&self) -> f64 {
        self.interest + self.principal_payment
    }
}

/// Amortization schedule with no interest-only period.
pub fn build_schedule(
    principal: f64,
    annual_rate: f64,
    term_months: u32,
    amortization: AmortizationType,
) -> Vec<ScheduleEntry> {
    build_schedule_with_interest_only(principal, annual_rate, term_months, amortization, 0)
}

/// Amortization schedule where the first `interest_only_months` pay interest
/// only and the principal amortizes over the remaining months.
///
/// Principal 0 or term 0 gives an empty schedule. The final entry absorbs
/// floating-point residue so principal payments sum to the principal and
/// the closing balance is exactly zero.
pub fn build_schedule_with_interest_only(
    principal: f64,
    annual_rate: f64,
    term_months: u32,
    amortization: AmortizationType,
    interest_only_months: u32,
) -> Vec<ScheduleEntry> {
    if principal <= 0.0 || term_months == 0 {
        return Vec::new();
    }
    let io_months = interest_only_months.min(term_months - 1);
    let amortizing_months = term_months - io_months;
    let rate = annual_rate / 12.0;

    let level_payment = if rate > 0.0 {
        // Past i32::MAX periods the discount factor is already 0.
        let periods = i32::try_from(amortizing_months).unwrap_or(i32::MAX);
        principal * rate / (1.0 - (1.0 + rate).powi(-periods))
    } else {
        principal / amortizing_months as f64
    };
    let level_principal = principal / amortizing_months as f64;

    let mut schedule = Vec::with_capacity(term_months.min(MAX_MONTHS) as usize);
    let mut balance = principal;
    for month in 1..=term_months {
        let interest = balance * rate;
        let principal_payment = if month <= io_months {
            0.0
        } else if month == term_months {
            balance
        } else {
            match amortization {
                AmortizationType::FullyAmortizing => (level_payment - interest).min(balance),
                AmortizationType::FixedPrincipal  => level_principal.min(balance),
            }
        };
        balance -= principal_payment;
        if month == term_months {
            balance = 0.0;
        }
        schedule.push(ScheduleEntry {
            month,
            interest,
            principal_payment,
            remaining_balance: balance,
        });
    }
    schedule
}

/// A loan with its precomputed, immutable schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub name:                 String,
    pub principal:            f64,
    pub annual_rate:          f64,
    pub term_months:          u32,
    pub amortization:         AmortizationType,
    pub interest_only_months: u32,
    schedule:                 Vec<ScheduleEntry>,
}

impl Loan {
    pub fn from_config(config: &LoanConfig) -> Result<Self, ConfigError> {
        if config.principal > 0.0 && config.term_months == 0 {
            return Err(ConfigError::NotPositive {
                field: format!("loans.{}.term_months", config.name),
            });
        }
        if config.term_months > MAX_MONTHS {
            return Err(ConfigError::OutOfRange {
                field: format!("loans.{}.term_months", config.name),
                value: config.term_months as f64,
                min:   0.0,
                max:   MAX_MONTHS as f64,
            });
        }
        Ok(Self {
            name:                 config.name.clone(),
            principal:            config.principal,
            annual_rate:          config.annual_rate,
            term_months:          config.term_months,
            amortization:         config.amortization,
            interest_only_months: config.interest_only_months,
            schedule:             build_schedule_with_interest_only(
                config.principal,
                config.annual_rate,
                config.term_months,
                config.amortization,
                config.interest_only_months,
            ),
        })
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    /// Scheduled payment in `month`; 0 outside the schedule.
    pub fn payment_due(&self, month: Month) -> f64 {
        month
            .checked_sub(1)
            .and_then(|i| self.schedule.get(i as usize))
            .map(ScheduleEntry::payment)
            .unwrap_or(0.0)
    }

    pub fn total_interest(&self) -> f64 {
        self.schedule.iter().map(|e| e.interest).sum()
    }
}

/// All loans of a scenario, summed per month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtSchedule {
    loans: Vec<Loan>,
}

impl DebtSchedule {
    pub fn new(loans: Vec<Loan>) -> Self {
        Self { loans }
    }

    pub fn from_params(params: &ParameterSet) -> Result<Self, ConfigError> {
        let loans = params
            .loans()
            .iter()
            .map(Loan::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(loans))
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    /// Total scheduled debt service due in `month` across every loan.
    pub fn debt_service(&self, month: Month) -> f64 {
        self.loans.iter().map(|l| l.payment_due(month)).sum()
    }
}

/// Debt-service coverage for one period: net operating income before debt
/// service over scheduled debt service. Undefined when nothing is due.
pub fn dscr(net_operating_income: f64, debt_service: f64) -> Metric {
    Metric::ratio(net_operating_income, debt_service)
}
