// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR matrix encoding via the `qrcode` crate.

use codepress_core::error::{CodepressError, Result};
use codepress_core::{EcLevel, ModuleMatrix};
use qrcode::{Color, QrCode, Version};

use crate::traits::QrEncoder;

#[derive(Debug, Default, Clone, Copy)]
pub struct QrcodeEncoder;

fn ec_level(ec: EcLevel) -> qrcode::EcLevel {
    match ec {
        EcLevel::L => qrcode::EcLevel::L,
        EcLevel::M => qrcode::EcLevel::M,
        EcLevel::Q => qrcode::EcLevel::Q,
        EcLevel::H => qrcode::EcLevel::H,
    }
}

impl QrEncoder for QrcodeEncoder {
    fn encode_qr(&self, data: &str, version: Option<u8>, ec: EcLevel) -> Result<ModuleMatrix> {
        let code = match version {
            Some(v) => QrCode::with_version(
                data.as_bytes(),
                Version::Normal(i16::from(v)),
                ec_level(ec),
            ),
            None => QrCode::with_error_correction_level(data.as_bytes(), ec_level(ec)),
        }
        .map_err(|e| CodepressError::Encoding(format!("QR: {e}")))?;

        let side = code.width();
        let modules = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        ModuleMatrix::new(side, modules)
    }
}
