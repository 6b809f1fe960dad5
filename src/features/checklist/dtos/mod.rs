mod checklist_dto;

pub use checklist_dto::{
    is_photo_type_allowed, ChecklistEntryDto, ChecklistQuery, DeviceAuditInput,
    ExpectedLocationDto, SubmitChecklistDto, SubmitChecklistForm, UpsertExpectedLocationDto,
};
