//! Fictional reference data for the portal.
//!
//! Hospital names and addresses follow real Nicaraguan facilities so the
//! directory reads naturally; doctors, patients and records are invented.

use chrono::NaiveDate;

use super::{Catalog, DemoAccount, Department};
use crate::models::{
    Appointment, AppointmentStatus, AttachedDocument, Coordinates, Doctor, ExamEntry, ExamStatus,
    Hospital, HospitalTier, MedicalRecord, MedicationEntry, RecordStatus, RecordType, User,
};

/// The only department with bookable hospitals today.
pub const AVAILABLE_DEPARTMENTS: &[&str] = &["Managua"];

pub const DEPARTMENTS: &[&str] = &[
    "Boaco", "Carazo", "Chinandega", "Chontales", "Estelí", "Granada",
    "Jinotega", "León", "Madriz", "Managua", "Masaya", "Matagalpa",
    "Nueva Segovia", "Río San Juan", "Rivas", "RACCN", "RACCS",
];

pub const SPECIALTIES: &[&str] = &[
    "Medicina General",
    "Cardiología",
    "Pediatría",
    "Ginecología",
    "Dermatología",
    "Neurología",
    "Ortopedia",
    "Oftalmología",
    "Medicina Interna",
];

pub const DEMO_PATIENT_ID: &str = "pac-001";

const WEEKDAY_SCHEDULE: &str = "Lunes a Viernes 8:00 - 16:00";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(super) fn build() -> Catalog {
    Catalog {
        departments: DEPARTMENTS
            .iter()
            .map(|name| Department {
                name: name.to_string(),
                available: AVAILABLE_DEPARTMENTS.contains(name),
            })
            .collect(),
        specialties: strings(SPECIALTIES),
        hospitals: hospitals(),
        doctors: doctors(),
        appointments: appointments(),
        records: records(),
        accounts: accounts(),
    }
}

#[allow(clippy::too_many_arguments)]
fn hospital(
    id: &str,
    name: &str,
    address: &str,
    municipality: &str,
    phone: &str,
    (lat, lng): (f64, f64),
    services: &[&str],
    tier: HospitalTier,
) -> Hospital {
    Hospital {
        id: id.into(),
        name: name.into(),
        address: address.into(),
        municipality: municipality.into(),
        phone: phone.into(),
        coordinates: Coordinates { lat, lng },
        services: strings(services),
        tier,
    }
}

fn hospitals() -> Vec<Hospital> {
    vec![
        hospital(
            "h-001",
            "Hospital Vivian Pellas",
            "Km 9¾ Carretera a Masaya, 250 m al oeste",
            "Managua",
            "+505 2255 6900",
            (12.0760, -86.2262),
            &[
                "Medicina General", "Cardiología", "Pediatría", "Ginecología",
                "Dermatología", "Neurología", "Ortopedia", "Oftalmología",
            ],
            HospitalTier::Private,
        ),
        hospital(
            "h-002",
            "Hospital Militar Escuela Dr. Alejandro Dávila Bolaños",
            "Loma de Tiscapa, Managua",
            "Managua",
            "+505 2222 2172",
            (12.1410, -86.2700),
            &["Medicina General", "Cardiología", "Medicina Interna", "Ortopedia", "Neurología"],
            HospitalTier::SemiPrivate,
        ),
        hospital(
            "h-003",
            "Hospital Escuela Antonio Lenin Fonseca",
            "Barrio Las Brisas, Managua",
            "Managua",
            "+505 2266 2281",
            (12.1293, -86.3005),
            &["Medicina General", "Neurología", "Ortopedia", "Medicina Interna"],
            HospitalTier::Public,
        ),
        hospital(
            "h-004",
            "Hospital Escuela Roberto Calderón Gutiérrez",
            "Costado oeste del Mercado Roberto Huembes",
            "Managua",
            "+505 2278 1900",
            (12.1265, -86.2440),
            &["Medicina General", "Cardiología", "Medicina Interna"],
            HospitalTier::Public,
        ),
        hospital(
            "h-005",
            "Hospital Bertha Calderón Roque",
            "Centro Comercial Zumen, 1 c. al oeste",
            "Managua",
            "+505 2266 6560",
            (12.1330, -86.2870),
            &["Medicina General", "Ginecología"],
            HospitalTier::Public,
        ),
        hospital(
            "h-006",
            "Hospital Infantil Manuel de Jesús Rivera",
            "Barrio Ariel Darce, Managua",
            "Managua",
            "+505 2289 7700",
            (12.1215, -86.2320),
            &["Pediatría"],
            HospitalTier::Public,
        ),
        hospital(
            "h-007",
            "Hospital Salud Integral",
            "Esquina opuesta a la Clínica Tiscapa",
            "Managua",
            "+505 2251 0310",
            (12.1325, -86.2645),
            &["Medicina General", "Cardiología", "Dermatología", "Oftalmología", "Pediatría"],
            HospitalTier::Private,
        ),
        hospital(
            "h-008",
            "Hospital Alemán Nicaragüense",
            "Km 6 Carretera Norte, Managua",
            "Managua",
            "+505 2249 0970",
            (12.1475, -86.2250),
            &["Medicina General", "Pediatría", "Ginecología", "Ortopedia", "Oftalmología"],
            HospitalTier::Public,
        ),
        hospital(
            "h-009",
            "Hospital Escuela Oscar Danilo Rosales Argüello",
            "Frente a la Iglesia La Merced, León",
            "León",
            "+505 2311 6990",
            (12.4350, -86.8790),
            &["Medicina General", "Cardiología", "Pediatría", "Ginecología"],
            HospitalTier::Public,
        ),
        hospital(
            "h-010",
            "Hospital Amistad Japón-Nicaragua",
            "Salida a Managua, Granada",
            "Granada",
            "+505 2552 2719",
            (11.9420, -85.9620),
            &["Medicina General", "Cardiología", "Pediatría"],
            HospitalTier::Public,
        ),
    ]
}

fn doctor(id: &str, name: &str, specialty: &str, hospital_id: &str, available: bool) -> Doctor {
    Doctor {
        id: id.into(),
        name: name.into(),
        specialty: specialty.into(),
        hospital_id: hospital_id.into(),
        available,
        schedule: WEEKDAY_SCHEDULE.into(),
    }
}

fn doctors() -> Vec<Doctor> {
    vec![
        doctor("d-001", "Dra. Ana Lucía Martínez", "Cardiología", "h-001", true),
        doctor("d-002", "Dr. Carlos Eduardo Ruiz", "Pediatría", "h-001", true),
        doctor("d-003", "Dra. Sofía Herrera", "Ginecología", "h-001", true),
        doctor("d-004", "Dr. Miguel Ángel Torres", "Cardiología", "h-002", true),
        doctor("d-005", "Dr. Roberto Castillo", "Ortopedia", "h-002", true),
        doctor("d-006", "Dra. Carmen Espinoza", "Neurología", "h-003", true),
        doctor("d-007", "Dr. Luis Fernando Mendoza", "Medicina Interna", "h-004", true),
        doctor("d-008", "Dr. Javier Solórzano", "Cardiología", "h-004", false),
        doctor("d-009", "Dra. Patricia Gutiérrez", "Ginecología", "h-005", true),
        doctor("d-010", "Dra. Isabel Morales", "Pediatría", "h-006", true),
        doctor("d-011", "Dr. Andrés Chamorro", "Dermatología", "h-007", true),
        doctor("d-012", "Dra. Gabriela Rivas", "Cardiología", "h-007", true),
        doctor("d-013", "Dr. José Ramón López", "Medicina General", "h-008", true),
        doctor("d-014", "Dra. Elena Baltodano", "Oftalmología", "h-001", true),
        doctor("d-015", "Dr. Francisco Jarquín", "Cardiología", "h-009", true),
        doctor("d-016", "Dra. Mariela Pastora", "Pediatría", "h-010", true),
    ]
}

#[allow(clippy::too_many_arguments)]
fn appointment(
    id: &str,
    doctor_id: &str,
    hospital_id: &str,
    on: NaiveDate,
    time: &str,
    specialty: &str,
    status: AppointmentStatus,
    reason: &str,
) -> Appointment {
    Appointment {
        id: id.into(),
        patient_id: DEMO_PATIENT_ID.into(),
        doctor_id: doctor_id.into(),
        hospital_id: hospital_id.into(),
        date: on,
        time: time.into(),
        specialty: specialty.into(),
        status,
        reason: reason.into(),
    }
}

fn appointments() -> Vec<Appointment> {
    use AppointmentStatus::*;
    vec![
        appointment("a-001", "d-001", "h-001", date(2026, 11, 5), "09:00", "Cardiología", Confirmada, "Control de presión arterial"),
        appointment("a-002", "d-013", "h-008", date(2026, 11, 20), "14:00", "Medicina General", Programada, "Chequeo general anual"),
        appointment("a-003", "d-011", "h-007", date(2026, 12, 2), "10:00", "Dermatología", Reagendada, "Revisión de lunar en espalda"),
        appointment("a-004", "d-009", "h-005", date(2026, 8, 14), "08:00", "Ginecología", Completada, "Control ginecológico"),
        appointment("a-005", "d-006", "h-003", date(2026, 6, 3), "11:00", "Neurología", Completada, "Cefalea recurrente"),
        appointment("a-006", "d-014", "h-001", date(2026, 9, 10), "15:00", "Oftalmología", Cancelada, "Revisión de la vista"),
    ]
}

fn medication(name: &str, dose: &str, frequency: &str, duration: &str) -> MedicationEntry {
    MedicationEntry {
        name: name.into(),
        dose: dose.into(),
        frequency: frequency.into(),
        duration: duration.into(),
    }
}

fn exam(exam_type: &str, result: &str, values: Option<&str>, status: ExamStatus) -> ExamEntry {
    ExamEntry {
        exam_type: exam_type.into(),
        result: result.into(),
        values: values.map(Into::into),
        status,
    }
}

fn document(name: &str, kind: &str, size: &str) -> AttachedDocument {
    AttachedDocument {
        name: name.into(),
        kind: kind.into(),
        size: size.into(),
    }
}

fn records() -> Vec<MedicalRecord> {
    vec![
        MedicalRecord {
            id: "r-001".into(),
            date: date(2026, 8, 14),
            record_type: RecordType::Consultation,
            specialty: "Ginecología".into(),
            doctor: "Dra. Patricia Gutiérrez".into(),
            hospital: "Hospital Bertha Calderón Roque".into(),
            diagnosis: "Control ginecológico sin hallazgos".into(),
            treatment: "Ninguno. Control anual.".into(),
            medications: vec![],
            exams: vec![exam("Papanicolaou", "Negativo", None, ExamStatus::Normal)],
            notes: "Paciente asintomática.".into(),
            next_review: Some(date(2027, 8, 14)),
            documents: vec![document("resultado_pap.pdf", "pdf", "180 KB")],
            status: RecordStatus::Completed,
        },
        MedicalRecord {
            id: "r-002".into(),
            date: date(2026, 7, 2),
            record_type: RecordType::Exam,
            specialty: "Medicina Interna".into(),
            doctor: "Dr. Luis Fernando Mendoza".into(),
            hospital: "Hospital Escuela Roberto Calderón Gutiérrez".into(),
            diagnosis: "Dislipidemia".into(),
            treatment: "Dieta baja en grasas y estatina por tres meses".into(),
            medications: vec![medication("Atorvastatina", "20 mg", "Una vez al día", "3 meses")],
            exams: vec![
                exam("Colesterol total", "Elevado", Some("245 mg/dL"), ExamStatus::Abnormal),
                exam("Triglicéridos", "Elevado", Some("190 mg/dL"), ExamStatus::Abnormal),
                exam("Glucosa en ayunas", "Normal", Some("92 mg/dL"), ExamStatus::Normal),
            ],
            notes: "Repetir perfil lipídico al finalizar el tratamiento.".into(),
            next_review: Some(date(2026, 10, 2)),
            documents: vec![document("perfil_lipidico.pdf", "pdf", "240 KB")],
            status: RecordStatus::Active,
        },
        MedicalRecord {
            id: "r-003".into(),
            date: date(2026, 6, 3),
            record_type: RecordType::Consultation,
            specialty: "Neurología".into(),
            doctor: "Dra. Carmen Espinoza".into(),
            hospital: "Hospital Escuela Antonio Lenin Fonseca".into(),
            diagnosis: "Migraña sin aura".into(),
            treatment: "Analgésico en crisis y diario de cefaleas".into(),
            medications: vec![medication("Sumatriptán", "50 mg", "Al inicio de la crisis", "Según necesidad")],
            exams: vec![],
            notes: "Evitar ayuno prolongado y desvelo.".into(),
            next_review: None,
            documents: vec![],
            status: RecordStatus::Completed,
        },
        MedicalRecord {
            id: "r-004".into(),
            date: date(2026, 4, 18),
            record_type: RecordType::Vaccine,
            specialty: "Medicina General".into(),
            doctor: "Dr. José Ramón López".into(),
            hospital: "Hospital Alemán Nicaragüense".into(),
            diagnosis: "Vacunación contra influenza estacional".into(),
            treatment: "Dosis única intramuscular".into(),
            medications: vec![],
            exams: vec![],
            notes: "Sin reacciones adversas.".into(),
            next_review: Some(date(2027, 4, 18)),
            documents: vec![document("tarjeta_vacunacion.jpg", "image", "95 KB")],
            status: RecordStatus::Completed,
        },
        MedicalRecord {
            id: "r-005".into(),
            date: date(2026, 2, 11),
            record_type: RecordType::Emergency,
            specialty: "Medicina General".into(),
            doctor: "Dr. José Ramón López".into(),
            hospital: "Hospital Alemán Nicaragüense".into(),
            diagnosis: "Gastroenteritis aguda".into(),
            treatment: "Hidratación oral y dieta blanda".into(),
            medications: vec![medication("Suero oral", "1 sobre", "Después de cada evacuación", "3 días")],
            exams: vec![exam("Examen general de heces", "Pendiente", None, ExamStatus::Pending)],
            notes: "Regresar si presenta fiebre persistente.".into(),
            next_review: None,
            documents: vec![],
            status: RecordStatus::Completed,
        },
        MedicalRecord {
            id: "r-006".into(),
            date: date(2025, 11, 20),
            record_type: RecordType::Procedure,
            specialty: "Cardiología".into(),
            doctor: "Dra. Ana Lucía Martínez".into(),
            hospital: "Hospital Vivian Pellas".into(),
            diagnosis: "Hipertensión arterial controlada".into(),
            treatment: "Electrocardiograma de control y antihipertensivo".into(),
            medications: vec![medication("Losartán", "50 mg", "Una vez al día", "Indefinido")],
            exams: vec![exam("Electrocardiograma", "Ritmo sinusal normal", None, ExamStatus::Normal)],
            notes: "Mantener registro de presión en casa.".into(),
            next_review: Some(date(2026, 11, 5)),
            documents: vec![document("ecg_2025.pdf", "pdf", "1.2 MB")],
            status: RecordStatus::Active,
        },
    ]
}

fn accounts() -> Vec<DemoAccount> {
    vec![
        DemoAccount {
            email: "maria.gonzalez@email.com".into(),
            password: "123456".into(),
            user: User {
                id: DEMO_PATIENT_ID.into(),
                name: "María José González".into(),
                cedula: "001-120890-0001C".into(),
                phone: "+505 8888 9999".into(),
                email: "maria.gonzalez@email.com".into(),
                birth_date: date(1990, 8, 12),
                municipality: "Managua".into(),
                allergies: strings(&["Penicilina", "Mariscos"]),
                medical_history: strings(&["Hipertensión arterial", "Migraña"]),
            },
        },
        DemoAccount {
            email: "carlos.perez@email.com".into(),
            password: "paciente1".into(),
            user: User {
                id: "pac-002".into(),
                name: "Carlos Pérez".into(),
                cedula: "281-050375-0002B".into(),
                phone: "+505 7777 1234".into(),
                email: "carlos.perez@email.com".into(),
                birth_date: date(1975, 3, 5),
                municipality: "León".into(),
                allergies: vec![],
                medical_history: strings(&["Diabetes tipo 2"]),
            },
        },
    ]
}
