//! Built-in assessments. Column order matches the order each classifier
//! was trained on and must not be changed.

use super::{DiseaseSchema, FeatureSpec, SchemaError};

pub const KIDNEY: &str = "Kidney";
pub const STROKE: &str = "Stroke";
pub const ALZHEIMERS: &str = "Alzheimers";
pub const DIABETES: &str = "Diabetes";

const BINARY_FLAG: &[(&str, i64)] = &[("0", 0), ("1", 1)];

const ALZHEIMERS_SYMPTOMS: &str = "Primary symptoms: 1. Difficulty speaking, 2. Loss of balance, \
3. Seizures, 4. Severe fatigue, 5. Dizziness, 6. Confusion, 7. Numbness, 8. Weakness, \
9. Blurred vision, 10. Headache";

/// All built-in schemas in menu order.
pub fn all() -> Result<Vec<DiseaseSchema>, SchemaError> {
    Ok(vec![kidney()?, stroke()?, alzheimers()?, diabetes()?])
}

pub fn kidney() -> Result<DiseaseSchema, SchemaError> {
    DiseaseSchema::new(
        KIDNEY,
        "Kidney Disease Prediction",
        vec![
            FeatureSpec::numeric("Age"),
            FeatureSpec::numeric("SystolicBP"),
            FeatureSpec::numeric("DiastolicBP"),
            FeatureSpec::numeric("BMI"),
            FeatureSpec::numeric("FamilyHistoryKidneyDisease")
                .with_label("Family History (0=No,1=Yes)"),
            FeatureSpec::numeric("Smoking").with_label("Smoking (0=No,1=Yes)"),
            FeatureSpec::numeric("FastingBloodSugar").with_label("Fasting BloodSugar"),
            FeatureSpec::numeric("ProteinInUrine").with_label("Protein In Urine"),
            FeatureSpec::numeric("MedicalCheckupsFrequency")
                .with_label("Medical Checkups Frequency"),
        ],
    )
}

pub fn stroke() -> Result<DiseaseSchema, SchemaError> {
    DiseaseSchema::new(
        STROKE,
        "Stroke Prediction",
        vec![
            FeatureSpec::categorical("gender", &[("Male", 0), ("Female", 1), ("Other", 2)])
                .with_label("Gender"),
            FeatureSpec::numeric("age")
                .with_label("Age")
                .with_hint(Some(0.0), Some(120.0), Some(1.0)),
            FeatureSpec::categorical("hypertension", BINARY_FLAG)
                .with_label("Hypertension (0=No,1=Yes)"),
            FeatureSpec::categorical("heart_disease", BINARY_FLAG)
                .with_label("Heart Disease (0=No,1=Yes)"),
            FeatureSpec::categorical("ever_married", &[("Yes", 1), ("No", 0)])
                .with_label("Ever Married"),
            FeatureSpec::categorical(
                "work_type",
                &[
                    ("Private", 0),
                    ("Self-employed", 1),
                    ("Govt_job", 2),
                    ("children", 3),
                    ("Never_worked", 4),
                ],
            )
            .with_label("Work Type"),
            FeatureSpec::categorical("Residence_type", &[("Urban", 1), ("Rural", 0)])
                .with_label("Residence Type"),
            FeatureSpec::numeric("avg_glucose_level")
                .with_label("Average Glucose Level")
                .with_hint(Some(0.0), None, Some(0.1)),
            FeatureSpec::numeric("bmi")
                .with_label("BMI")
                .with_hint(Some(0.0), None, Some(0.1)),
            FeatureSpec::categorical(
                "smoking_status",
                &[
                    ("never smoked", 0),
                    ("formerly smoked", 1),
                    ("smokes", 2),
                    ("Unknown", 3),
                ],
            )
            .with_label("Smoking Status"),
        ],
    )
}

pub fn alzheimers() -> Result<DiseaseSchema, SchemaError> {
    Ok(DiseaseSchema::new(
        ALZHEIMERS,
        "Alzheimer's Prediction",
        vec![
            FeatureSpec::numeric("Age"),
            FeatureSpec::numeric("Gender").with_label("Gender (Male = 1, Female = 2, Others = 0)"),
            FeatureSpec::numeric("BMI").with_label("Body Mass Index"),
            FeatureSpec::numeric("Smoking").with_label("Smoking (0=No,1=Yes)"),
            FeatureSpec::numeric("AlcoholConsumption").with_label("Alcohol Consumption Measure"),
            FeatureSpec::numeric("PhysicalActivity").with_label("Physical Activity Measure"),
            FeatureSpec::numeric("Hypertension").with_label("Hypertension Record (0=No,1=Yes)"),
            FeatureSpec::numeric("SystolicBP").with_label("SystolicBP Value"),
            FeatureSpec::numeric("DiastolicBP").with_label("DiastolicBP Value"),
            FeatureSpec::numeric("Diabetes")
                .with_label("Ever had a Diabetes Record? (0=No,1=Yes)"),
        ],
    )?
    .with_note(ALZHEIMERS_SYMPTOMS))
}

pub fn diabetes() -> Result<DiseaseSchema, SchemaError> {
    DiseaseSchema::new(
        DIABETES,
        "Diabetes Prediction",
        vec![
            FeatureSpec::numeric("Pregnancies").with_label("Number of Pregnancies"),
            FeatureSpec::numeric("Glucose"),
            FeatureSpec::numeric("BloodPressure").with_label("Blood Pressure"),
            FeatureSpec::numeric("SkinThickness").with_label("Skin Thickness"),
            FeatureSpec::numeric("Insulin"),
            FeatureSpec::numeric("BMI").with_label("BMI Level"),
            FeatureSpec::numeric("DiabetesPedigreeFunction")
                .with_label("Diabetes Pedigree Function"),
            FeatureSpec::numeric("Age").with_label("Patient Age"),
        ],
    )
}
