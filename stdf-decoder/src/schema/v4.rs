//! STDF V4 record definitions
//!
//! Only record types made of scalar, string and bit fields are decoded.
//! Types carrying `kx` arrays are listed in [`SKIPPED`] so the parser can
//! name them when it steps over their bodies.

use super::{field, RecordSchema};
use crate::types::FieldKind::*;

pub static FAR: RecordSchema = RecordSchema {
    name: "FAR",
    rec_typ: 0,
    rec_sub: 10,
    fields: &[field("CPU_TYPE", U1), field("STDF_VER", U1)],
};

pub static ATR: RecordSchema = RecordSchema {
    name: "ATR",
    rec_typ: 0,
    rec_sub: 20,
    fields: &[field("MOD_TIM", U4), field("CMD_LINE", Cn)],
};

pub static MIR: RecordSchema = RecordSchema {
    name: "MIR",
    rec_typ: 1,
    rec_sub: 10,
    fields: &[
        field("SETUP_T", U4),
        field("START_T", U4),
        field("STAT_NUM", U1),
        field("MODE_COD", C1),
        field("RTST_COD", C1),
        field("PROT_COD", C1),
        field("BURN_TIM", U2),
        field("CMOD_COD", C1),
        field("LOT_ID", Cn),
        field("PART_TYP", Cn),
        field("NODE_NAM", Cn),
        field("TSTR_TYP", Cn),
        field("JOB_NAM", Cn),
        field("JOB_REV", Cn),
        field("SBLOT_ID", Cn),
        field("OPER_NAM", Cn),
        field("EXEC_TYP", Cn),
        field("EXEC_VER", Cn),
        field("TEST_COD", Cn),
        field("TST_TEMP", Cn),
        field("USER_TXT", Cn),
        field("AUX_FILE", Cn),
        field("PKG_TYP", Cn),
        field("FAMLY_ID", Cn),
        field("DATE_COD", Cn),
        field("FACIL_ID", Cn),
        field("FLOOR_ID", Cn),
        field("PROC_ID", Cn),
        field("OPER_FRQ", Cn),
        field("SPEC_NAM", Cn),
        field("SPEC_VER", Cn),
        field("FLOW_ID", Cn),
        field("SETUP_ID", Cn),
        field("DSGN_REV", Cn),
        field("ENG_ID", Cn),
        field("ROM_COD", Cn),
        field("SERL_NUM", Cn),
        field("SUPR_NAM", Cn),
    ],
};

pub static MRR: RecordSchema = RecordSchema {
    name: "MRR",
    rec_typ: 1,
    rec_sub: 20,
    fields: &[
        field("FINISH_T", U4),
        field("DISP_COD", C1),
        field("USR_DESC", Cn),
        field("EXC_DESC", Cn),
    ],
};

pub static PCR: RecordSchema = RecordSchema {
    name: "PCR",
    rec_typ: 1,
    rec_sub: 30,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_NUM", U1),
        field("PART_CNT", U4),
        field("RTST_CNT", U4),
        field("ABRT_CNT", U4),
        field("GOOD_CNT", U4),
        field("FUNC_CNT", U4),
    ],
};

pub static HBR: RecordSchema = RecordSchema {
    name: "HBR",
    rec_typ: 1,
    rec_sub: 40,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_NUM", U1),
        field("HBIN_NUM", U2),
        field("HBIN_CNT", U4),
        field("HBIN_PF", C1),
        field("HBIN_NAM", Cn),
    ],
};

pub static SBR: RecordSchema = RecordSchema {
    name: "SBR",
    rec_typ: 1,
    rec_sub: 50,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_NUM", U1),
        field("SBIN_NUM", U2),
        field("SBIN_CNT", U4),
        field("SBIN_PF", C1),
        field("SBIN_NAM", Cn),
    ],
};

pub static WIR: RecordSchema = RecordSchema {
    name: "WIR",
    rec_typ: 2,
    rec_sub: 10,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_GRP", U1),
        field("START_T", U4),
        field("WAFER_ID", Cn),
    ],
};

pub static WRR: RecordSchema = RecordSchema {
    name: "WRR",
    rec_typ: 2,
    rec_sub: 20,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_GRP", U1),
        field("FINISH_T", U4),
        field("PART_CNT", U4),
        field("RTST_CNT", U4),
        field("ABRT_CNT", U4),
        field("GOOD_CNT", U4),
        field("FUNC_CNT", U4),
        field("WAFER_ID", Cn),
        field("FABWF_ID", Cn),
        field("FRAME_ID", Cn),
        field("MASK_ID", Cn),
        field("USR_DESC", Cn),
        field("EXC_DESC", Cn),
    ],
};

pub static PIR: RecordSchema = RecordSchema {
    name: "PIR",
    rec_typ: 5,
    rec_sub: 10,
    fields: &[field("HEAD_NUM", U1), field("SITE_NUM", U1)],
};

pub static PRR: RecordSchema = RecordSchema {
    name: "PRR",
    rec_typ: 5,
    rec_sub: 20,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_NUM", U1),
        field("PART_FLG", B1),
        field("NUM_TEST", U2),
        field("HARD_BIN", U2),
        field("SOFT_BIN", U2),
        field("X_COORD", I2),
        field("Y_COORD", I2),
        field("TEST_T", U4),
        field("PART_ID", Cn),
        field("PART_TXT", Cn),
        field("PART_FIX", Bn),
    ],
};

pub static TSR: RecordSchema = RecordSchema {
    name: "TSR",
    rec_typ: 10,
    rec_sub: 30,
    fields: &[
        field("HEAD_NUM", U1),
        field("SITE_NUM", U1),
        field("TEST_TYP", C1),
        field("TEST_NUM", U4),
        field("EXEC_CNT", U4),
        field("FAIL_CNT", U4),
        field("ALRM_CNT", U4),
        field("TEST_NAM", Cn),
        field("SEQ_NAME", Cn),
        field("TEST_LBL", Cn),
        field("OPT_FLAG", B1),
        field("TEST_TIM", R4),
        field("TEST_MIN", R4),
        field("TEST_MAX", R4),
        field("TST_SUMS", R4),
        field("TST_SQRS", R4),
    ],
};

pub static PTR: RecordSchema = RecordSchema {
    name: "PTR",
    rec_typ: 15,
    rec_sub: 10,
    fields: &[
        field("TEST_NUM", U4),
        field("HEAD_NUM", U1),
        field("SITE_NUM", U1),
        field("TEST_FLG", B1),
        field("PARM_FLG", B1),
        field("RESULT", R4),
        field("TEST_TXT", Cn),
        field("ALARM_ID", Cn),
        field("OPT_FLAG", B1),
        field("RES_SCAL", I1),
        field("LLM_SCAL", I1),
        field("HLM_SCAL", I1),
        field("LO_LIMIT", R4),
        field("HI_LIMIT", R4),
        field("UNITS", Cn),
        field("C_RESFMT", Cn),
        field("C_LLMFMT", Cn),
        field("C_HLMFMT", Cn),
        field("LO_SPEC", R4),
        field("HI_SPEC", R4),
    ],
};

pub static BPS: RecordSchema = RecordSchema {
    name: "BPS",
    rec_typ: 20,
    rec_sub: 10,
    fields: &[field("SEQ_NAME", Cn)],
};

pub static EPS: RecordSchema = RecordSchema {
    name: "EPS",
    rec_typ: 20,
    rec_sub: 20,
    fields: &[],
};

pub static DTR: RecordSchema = RecordSchema {
    name: "DTR",
    rec_typ: 50,
    rec_sub: 30,
    fields: &[field("TEXT_DAT", Cn)],
};

/// All decodable V4 record types
pub static RECORDS: &[&RecordSchema] = &[
    &FAR, &ATR, &MIR, &MRR, &PCR, &HBR, &SBR, &WIR, &WRR, &PIR, &PRR, &TSR, &PTR, &BPS, &EPS,
    &DTR,
];

/// Known V4 record types whose array fields are not decoded
pub static SKIPPED: &[(u8, u8, &str)] = &[
    (1, 60, "PMR"),
    (1, 62, "PGR"),
    (1, 63, "PLR"),
    (1, 70, "RDR"),
    (1, 80, "SDR"),
    (2, 30, "WCR"),
    (15, 15, "MPR"),
    (15, 20, "FTR"),
    (50, 10, "GDR"),
];
